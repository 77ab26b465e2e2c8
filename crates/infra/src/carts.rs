//! Per-session carts, kept in memory only.
//!
//! Sessions are minted for every cookieless request, so carts left idle for
//! longer than the idle limit are dropped. The registry never holds more than
//! the carts touched within that window.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use counterpos_core::SessionId;
use counterpos_sales::Cart;

use crate::command_dispatcher::DispatchError;

/// Idle time after which an abandoned cart is forgotten.
pub const DEFAULT_IDLE_LIMIT: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug)]
struct Entry {
    cart: Cart,
    touched: Instant,
}

/// Carts by session. A session without a cart sees an empty one.
#[derive(Debug)]
pub struct CartRegistry {
    carts: RwLock<HashMap<SessionId, Entry>>,
    idle_limit: Duration,
}

impl Default for CartRegistry {
    fn default() -> Self {
        Self::with_idle_limit(DEFAULT_IDLE_LIMIT)
    }
}

impl CartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_limit(idle_limit: Duration) -> Self {
        Self {
            carts: RwLock::new(HashMap::new()),
            idle_limit,
        }
    }

    fn is_live(&self, entry: &Entry) -> bool {
        entry.touched.elapsed() < self.idle_limit
    }

    /// Snapshot of the session's cart.
    pub fn get(&self, session: SessionId) -> Result<Cart, DispatchError> {
        let carts = self.carts.read().map_err(|_| DispatchError::Poisoned)?;
        Ok(carts
            .get(&session)
            .filter(|entry| self.is_live(entry))
            .map(|entry| entry.cart.clone())
            .unwrap_or_default())
    }

    /// Run `f` against the session's cart. The cart is kept only when `f`
    /// succeeds; empty carts are dropped from the registry, and so are carts
    /// of other sessions that went idle.
    pub fn update<T, F>(&self, session: SessionId, f: F) -> Result<T, DispatchError>
    where
        F: FnOnce(&mut Cart) -> Result<T, DispatchError>,
    {
        let mut carts = self.carts.write().map_err(|_| DispatchError::Poisoned)?;
        let mut cart = carts
            .get(&session)
            .filter(|entry| self.is_live(entry))
            .map(|entry| entry.cart.clone())
            .unwrap_or_default();
        let out = f(&mut cart)?;

        let before = carts.len();
        carts.retain(|id, entry| *id == session || self.is_live(entry));
        if carts.len() < before {
            tracing::debug!(dropped = before - carts.len(), "dropped idle carts");
        }

        if cart.is_empty() && cart.customer().is_none() {
            carts.remove(&session);
        } else {
            carts.insert(
                session,
                Entry {
                    cart,
                    touched: Instant::now(),
                },
            );
        }
        Ok(out)
    }

    pub fn clear(&self, session: SessionId) -> Result<(), DispatchError> {
        let mut carts = self.carts.write().map_err(|_| DispatchError::Poisoned)?;
        carts.remove(&session);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.carts.read().map_or(0, |carts| carts.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
