use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use counterpos_events::{EventBus, Subscription};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    ///
    /// Messages already published are handled before the worker exits.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Generic event worker loop.
///
/// - Subscribes to an event bus
/// - Applies a handler to each message, in publication order
/// - Supports graceful shutdown
#[derive(Debug)]
pub struct EventWorker;

impl EventWorker {
    /// Spawn a worker thread that processes messages from a bus subscription.
    ///
    /// The subscription is taken before this returns, so nothing published
    /// afterwards is missed.
    pub fn spawn<M, B, H, E>(name: &'static str, bus: &B, mut handler: H) -> io::Result<WorkerHandle>
    where
        M: Send + 'static,
        B: EventBus<M> + ?Sized,
        H: FnMut(M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<M> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, &mut handler))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<M, H, E>(
    name: &'static str,
    sub: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    handler: &mut H,
) where
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(250);
    let mut handle = |msg: M| {
        if let Err(err) = handler(msg) {
            warn!(worker = name, error = ?err, "event worker handler failed");
        }
    };

    loop {
        if shutdown_rx.try_recv().is_ok() {
            // Drain what was published before shutdown was requested.
            while let Ok(msg) = sub.try_recv() {
                handle(msg);
            }
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(msg) => handle(msg),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(worker = name, "event worker stopped");
}
