use std::io;
use std::sync::Arc;

use counterpos_events::EventBus;

use super::event_worker::{EventWorker, WorkerHandle};
use crate::activity_log::ActivityLog;
use crate::command_dispatcher::Envelope;

/// Append the summary of every published event to `log`.
pub fn spawn_activity_logger<B>(bus: &B, log: Arc<ActivityLog>) -> io::Result<WorkerHandle>
where
    B: EventBus<Envelope> + ?Sized,
{
    EventWorker::spawn("activity-log", bus, move |envelope: Envelope| {
        log.append(envelope.occurred_at(), envelope.summary())
    })
}
