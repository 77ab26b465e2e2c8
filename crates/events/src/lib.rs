//! Domain events and their in-process distribution.
//!
//! Every accepted command produces events. The dispatcher wraps them in
//! [`EventEnvelope`]s and publishes them on an [`EventBus`]; the activity log
//! is one such subscriber.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
