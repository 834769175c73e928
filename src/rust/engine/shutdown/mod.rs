use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::engine::instrument::Instrument;
use crate::tools::logger::Logger;

/// Stops new work and releases the instrument, once.
///
/// Work already in flight (a playback, a training run) is abandoned rather
/// than drained; anything it tries to do with the instrument afterwards
/// fails with `InstrumentError::Closed`.
pub struct ShutdownCoordinator {
    stop: watch::Sender<bool>,
    done: AtomicBool,
    instrument: Arc<dyn Instrument>,
    logger: Arc<Logger>,
}

/// Cloneable view of the stop flag for long-running tasks.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownCoordinator {
    pub fn new(instrument: Arc<dyn Instrument>, logger: Arc<Logger>) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            stop,
            done: AtomicBool::new(false),
            instrument,
            logger,
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.stop.subscribe(),
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Tell every task to stop scheduling work, then close the instrument.
    /// Only the first call does anything; it returns `true`.
    pub fn shutdown(&self) -> bool {
        if self.done.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.stop.send_replace(true);
        self.logger.debug("Closing instrument...");
        if let Err(err) = self.instrument.close() {
            self.logger
                .error(format!("Failed to close instrument: {err}"));
        }
        true
    }

    /// Wait for `interrupt` to complete, then shut down.
    pub async fn watch<F>(&self, interrupt: F)
    where
        F: Future<Output = ()>,
    {
        interrupt.await;
        self.logger.watch("Interrupt received, stopping");
        self.shutdown();
    }
}

impl ShutdownSignal {
    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested (or the coordinator is gone).
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

#[cfg(test)]
#[path = "test_shutdown.rs"]
mod tests;
