use std::sync::RwLock;

use super::{AggregateStore, StoreError};

/// In-memory aggregate store.
///
/// Intended for tests/dev. `load` hands out clones.
#[derive(Debug, Default)]
pub struct InMemoryAggregateStore<A> {
    state: RwLock<A>,
}

impl<A> InMemoryAggregateStore<A> {
    pub fn new(initial: A) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }
}

impl<A> AggregateStore<A> for InMemoryAggregateStore<A>
where
    A: Clone + Send + Sync,
{
    fn load(&self) -> Result<A, StoreError> {
        self.state
            .read()
            .map(|state| state.clone())
            .map_err(|_| StoreError::Poisoned)
    }

    fn save(&self, aggregate: &A) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        *state = aggregate.clone();
        Ok(())
    }
}
