//! Aggregate persistence boundary.
//!
//! Every aggregate is a whole sheet (or pair of sheets): `load` reads the
//! current state, `save` replaces it. Stores make no ordering or locking
//! promises; the dispatcher serializes writers.

pub mod in_memory;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub use in_memory::InMemoryAggregateStore;

/// Storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// A row (1-based, header is row 1) that cannot be turned into a record.
    #[error("sheet '{sheet}' row {row}: {message}")]
    Malformed {
        sheet: String,
        row: usize,
        message: String,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Load/save for one aggregate.
pub trait AggregateStore<A>: Send + Sync {
    fn load(&self) -> Result<A, StoreError>;

    fn save(&self, aggregate: &A) -> Result<(), StoreError>;
}

impl<A, S> AggregateStore<A> for Arc<S>
where
    S: AggregateStore<A> + ?Sized,
{
    fn load(&self) -> Result<A, StoreError> {
        (**self).load()
    }

    fn save(&self, aggregate: &A) -> Result<(), StoreError> {
        (**self).save(aggregate)
    }
}
