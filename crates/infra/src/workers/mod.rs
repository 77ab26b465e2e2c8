//! Background workers fed by the event bus.

pub mod activity;
pub mod event_worker;

pub use activity::spawn_activity_logger;
pub use event_worker::{EventWorker, WorkerHandle};
