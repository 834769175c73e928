/// Per-tick dispatch: turn a beat into playback without ever holding up the clock.
///
/// The clock pushes beats into a bounded queue and moves on. One worker
/// drains the queue in beat order, looks each beat up in the schedule and
/// hands non-empty note sets to the instrument on their own tasks, at most
/// `max_in_flight` at a time. Playback completion order is not tracked.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::engine::error::InstrumentError;
use crate::engine::instrument::Instrument;
use crate::engine::notes::Beat;
use crate::shared::store::SessionStore;
use crate::tools::logger::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Beats that may wait for the dispatch worker before the clock starts skipping.
    pub queue_capacity: usize,
    /// Concurrent playback calls into the instrument.
    pub max_in_flight: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_in_flight: 16,
        }
    }
}

/// Outcome of handing a beat to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Issue {
    Queued,
    /// Queue full; the beat was skipped.
    Overrun,
    /// Worker gone (shutting down).
    Stopped,
}

/// Sending side held by the clock.
pub struct Dispatcher {
    beats: mpsc::Sender<Beat>,
    logger: Arc<Logger>,
}

impl Dispatcher {
    /// Start the dispatch worker. It runs until every `Dispatcher` is dropped.
    pub fn spawn(
        store: Arc<SessionStore>,
        instrument: Arc<dyn Instrument>,
        bpm: u32,
        settings: DispatchSettings,
        logger: Arc<Logger>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
        let worker = DispatchWorker {
            store,
            instrument,
            bpm,
            permits: Arc::new(Semaphore::new(settings.max_in_flight.max(1))),
            logger: Arc::clone(&logger),
        };
        let handle = tokio::spawn(worker.run(rx));
        (Self { beats: tx, logger }, handle)
    }

    /// Queue `beat` for dispatch without waiting.
    pub fn issue(&self, beat: Beat) -> Issue {
        match self.beats.try_send(beat) {
            Ok(()) => Issue::Queued,
            Err(TrySendError::Full(_)) => {
                self.logger
                    .warn(format!("Dispatch queue full, skipping beat {beat}"));
                Issue::Overrun
            }
            Err(TrySendError::Closed(_)) => Issue::Stopped,
        }
    }
}

struct DispatchWorker {
    store: Arc<SessionStore>,
    instrument: Arc<dyn Instrument>,
    bpm: u32,
    permits: Arc<Semaphore>,
    logger: Arc<Logger>,
}

impl DispatchWorker {
    async fn run(self, mut beats: mpsc::Receiver<Beat>) {
        while let Some(beat) = beats.recv().await {
            let Some(notes) = self.store.notes_at(beat) else {
                continue;
            };
            self.store.mark_activity(beat);
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                break;
            };
            let instrument = Arc::clone(&self.instrument);
            let logger = Arc::clone(&self.logger);
            let bpm = self.bpm;
            tokio::spawn(async move {
                let _permit = permit;
                let count = notes.len();
                match instrument.play(notes, bpm).await {
                    Ok(()) => logger.debug(format!("beat {beat}: played {count} notes")),
                    Err(InstrumentError::Closed) => {
                        logger.debug(format!("beat {beat}: instrument closed, dropped"))
                    }
                    Err(err) => logger.error(format!("beat {beat}: {err}")),
                }
            });
        }
    }
}

#[cfg(test)]
#[path = "test_dispatch.rs"]
mod tests;
