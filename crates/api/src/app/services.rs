use std::{
    fs, io,
    sync::{Arc, Mutex},
};

use counterpos_events::InMemoryEventBus;
use counterpos_infra::{
    ActivityLog, Clock, Config, DispatchError, Envelope, PointOfSale, Stores,
    activity_log::STARTED,
    workers::{WorkerHandle, spawn_activity_logger},
};

use crate::app::errors;

pub type Bus = Arc<InMemoryEventBus<Envelope>>;

/// Everything the handlers need: the till, the activity log and the worker
/// feeding it.
#[derive(Debug)]
pub struct AppServices {
    pos: PointOfSale<Bus>,
    activity: Arc<ActivityLog>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl AppServices {
    /// Wire the workbooks under `config.data_dir` and start the activity logger.
    pub fn build(config: &Config, clock: Arc<dyn Clock>) -> io::Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let activity = Arc::new(ActivityLog::new(&config.activity_log));
        let worker = spawn_activity_logger(&bus, Arc::clone(&activity))?;
        activity.append(clock.now(), STARTED)?;

        let pos = PointOfSale::new(bus, Stores::workbooks(&config.data_dir), clock)
            .with_low_stock_threshold(config.low_stock_threshold);

        tracing::info!(
            data_dir = %config.data_dir.display(),
            activity_log = %config.activity_log.display(),
            "services ready"
        );

        Ok(Self {
            pos,
            activity,
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn pos(&self) -> &PointOfSale<Bus> {
        &self.pos
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Stop the activity logger after it drained what was published.
    pub fn shutdown(&self) {
        let handle = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            handle.shutdown();
        }
    }
}

/// Run a till operation off the async runtime; workbook access is blocking.
pub async fn blocking<T, F>(
    services: &Arc<AppServices>,
    f: F,
) -> Result<T, axum::response::Response>
where
    T: Send + 'static,
    F: FnOnce(&PointOfSale<Bus>) -> Result<T, DispatchError> + Send + 'static,
{
    let services = Arc::clone(services);
    match tokio::task::spawn_blocking(move || f(services.pos())).await {
        Ok(result) => result.map_err(errors::dispatch_error_to_response),
        Err(e) => {
            tracing::error!(error = %e, "till operation panicked");
            Err(errors::internal("till operation failed"))
        }
    }
}
