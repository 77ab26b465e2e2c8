//! Command execution pipeline.
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the aggregate from its workbook
//!   ↓
//! 2. Handle the command (pure decision logic, produces events)
//!   ↓
//! 3. Apply the events to the loaded state
//!   ↓
//! 4. Rewrite the touched workbooks
//!   ↓
//! 5. Publish the events to the bus (activity log, tests)
//! ```
//!
//! Writers are serialized by a single process-wide lock held for the whole
//! unit of work, so read-modify-write on a workbook never interleaves.
//! Checkout touches two aggregates (catalog and ledger); both are decided
//! before anything is written, and nothing is published unless every save
//! succeeded.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use counterpos_core::{Aggregate, DomainError};
use counterpos_events::{Event, EventBus, EventEnvelope};

use crate::store::{AggregateStore, StoreError};

/// Envelope type carried on the bus.
pub type Envelope = EventEnvelope<JsonValue>;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Domain validation failure (deterministic).
    #[error("{0}")]
    Validation(String),
    /// Domain invariant failure (deterministic).
    #[error("{0}")]
    InvariantViolation(String),
    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// Duplicate name, second closing for a day, already settled sale.
    #[error("{0}")]
    Conflict(String),
    /// Reading or rewriting a workbook failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// An event could not be serialized into its envelope.
    #[error("failed to serialize event: {0}")]
    Serialize(String),
    /// Publication failed after the workbooks were written.
    #[error("failed to publish event: {0}")]
    Publish(String),
    #[error("write lock poisoned")]
    Poisoned,
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
            DomainError::NotFound(what) => DispatchError::NotFound(what),
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
        }
    }
}

/// Reusable command execution engine for workbook-backed aggregates.
///
/// Holds the bus and the write lock; the stores are passed per call so one
/// dispatcher serves every aggregate. The lock guards the last published
/// sequence number.
#[derive(Debug)]
pub struct CommandDispatcher<B> {
    bus: B,
    sequence: Mutex<u64>,
}

impl<B> CommandDispatcher<B>
where
    B: EventBus<Envelope>,
{
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            sequence: Mutex::new(0),
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn lock(&self) -> Result<MutexGuard<'_, u64>, DispatchError> {
        self.sequence.lock().map_err(|_| DispatchError::Poisoned)
    }

    /// Start a unit of work. Blocks until no other writer is active.
    pub fn begin(&self) -> Result<UnitOfWork<'_, B>, DispatchError> {
        Ok(UnitOfWork {
            bus: &self.bus,
            sequence: self.lock()?,
            pending: Vec::new(),
            saves: Vec::new(),
        })
    }

    /// Load an aggregate outside any unit of work.
    ///
    /// Waits for an in-flight writer so multi-workbook commits are seen whole.
    pub fn read<A, S>(&self, store: &S) -> Result<A, DispatchError>
    where
        S: AggregateStore<A> + ?Sized,
    {
        let _guard = self.lock()?;
        Ok(store.load()?)
    }

    /// Load, decide, apply, save and publish a single command.
    ///
    /// Returns the evolved aggregate and the events it produced. A command
    /// that produces no events leaves the workbook untouched.
    pub fn dispatch<A, S>(
        &self,
        store: &S,
        aggregate_type: &str,
        command: &A::Command,
    ) -> Result<(A, Vec<A::Event>), DispatchError>
    where
        S: AggregateStore<A> + ?Sized,
        A: Aggregate<Error = DomainError> + Clone,
        A::Event: Event + Serialize,
    {
        let mut uow = self.begin()?;
        let mut aggregate = uow.load(store)?;
        let events = uow.execute(&mut aggregate, aggregate_type, command)?;
        if events.is_empty() {
            return Ok((aggregate, events));
        }

        uow.stage(store, aggregate.clone());
        uow.commit()?;
        Ok((aggregate, events))
    }
}

type PendingSave<'w> = Box<dyn FnOnce() -> Result<(), StoreError> + 'w>;

/// Commands against one or more aggregates, written and published together.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] discards
/// everything it decided; no workbook is touched.
pub struct UnitOfWork<'w, B> {
    bus: &'w B,
    sequence: MutexGuard<'w, u64>,
    pending: Vec<Envelope>,
    saves: Vec<PendingSave<'w>>,
}

impl<'w, B> UnitOfWork<'w, B>
where
    B: EventBus<Envelope>,
{
    pub fn load<A, S>(&self, store: &S) -> Result<A, DispatchError>
    where
        S: AggregateStore<A> + ?Sized,
    {
        Ok(store.load()?)
    }

    /// Decide and apply one command; its events are queued for publication.
    pub fn execute<A>(
        &mut self,
        aggregate: &mut A,
        aggregate_type: &str,
        command: &A::Command,
    ) -> Result<Vec<A::Event>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: Event + Serialize,
    {
        let events = aggregate.handle(command)?;

        for event in &events {
            let sequence = *self.sequence + self.pending.len() as u64 + 1;
            let envelope = EventEnvelope::wrap(aggregate_type, sequence, event)
                .map_err(|e| DispatchError::Serialize(e.to_string()))?;
            aggregate.apply(event);
            self.pending.push(envelope);
        }

        Ok(events)
    }

    /// Queue `aggregate` to be written to `store` on commit.
    pub fn stage<A, S>(&mut self, store: &'w S, aggregate: A)
    where
        S: AggregateStore<A> + ?Sized,
        A: 'w,
    {
        self.saves.push(Box::new(move || store.save(&aggregate)));
    }

    /// Write every staged aggregate in order, then publish the queued events.
    ///
    /// Returns the published envelopes.
    pub fn commit(self) -> Result<Vec<Envelope>, DispatchError> {
        self.commit_then(|| Ok(())).map(|(envelopes, ())| envelopes)
    }

    /// Like [`UnitOfWork::commit`], running `after` once every save
    /// succeeded and before the write lock is released.
    pub fn commit_then<T, F>(mut self, after: F) -> Result<(Vec<Envelope>, T), DispatchError>
    where
        F: FnOnce() -> Result<T, DispatchError>,
    {
        for save in self.saves.drain(..) {
            save()?;
        }
        let out = after()?;

        let envelopes = std::mem::take(&mut self.pending);
        *self.sequence += envelopes.len() as u64;

        for envelope in &envelopes {
            tracing::debug!(
                sequence = envelope.sequence_number(),
                event_type = envelope.event_type(),
                "publishing event"
            );
            self.bus
                .publish(envelope.clone())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        Ok((envelopes, out))
    }
}
