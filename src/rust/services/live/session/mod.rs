use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::engine::clock::TickClock;
use crate::engine::composer::SharedComposer;
use crate::engine::dispatch::Dispatcher;
use crate::engine::history::NoteLog;
use crate::engine::improvise::ImprovisationTrigger;
use crate::engine::instrument::Instrument;
use crate::engine::listener::EventListener;
use crate::engine::notes::Beat;
use crate::engine::shutdown::ShutdownCoordinator;
use crate::platform::config::AppConfig;
use crate::shared::store::SessionStore;
use crate::tools::logger::Logger;

/// What a finished session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub ticks: u64,
    pub final_beat: Beat,
    /// Notes appended to the history during this run.
    pub notes_recorded: usize,
    pub scheduled: usize,
}

pub struct LiveSession {
    config: AppConfig,
    instrument: Arc<dyn Instrument>,
    composer: SharedComposer,
    store: Arc<SessionStore>,
    logger: Arc<Logger>,
}

impl LiveSession {
    /// Load the saved history (or start empty) and prepare the session.
    pub fn new(
        config: AppConfig,
        instrument: Arc<dyn Instrument>,
        composer: SharedComposer,
        logger: Arc<Logger>,
    ) -> Self {
        let history = NoteLog::load_or_empty(&config.paths.history, &logger);
        Self {
            config,
            instrument,
            composer,
            store: Arc::new(SessionStore::with_history(history)),
            logger,
        }
    }

    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    /// Run the clock, listener and dispatcher until `interrupt` resolves.
    ///
    /// Failing to open the instrument input is fatal. Anything still in
    /// flight when the session stops is abandoned.
    pub async fn run_until<F>(self, interrupt: F) -> Result<SessionReport>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let stream = self
            .instrument
            .listen()
            .context("failed to start listening to the instrument")?;
        let recorded_before = self.store.log_len();

        let coordinator = Arc::new(ShutdownCoordinator::new(
            Arc::clone(&self.instrument),
            Arc::clone(&self.logger),
        ));
        let trigger = Arc::new(ImprovisationTrigger::new(
            Arc::clone(&self.store),
            Arc::clone(&self.composer),
            self.config.improvisation,
            Arc::clone(&self.logger),
        ));
        let (dispatcher, worker) = Dispatcher::spawn(
            Arc::clone(&self.store),
            Arc::clone(&self.instrument),
            self.config.tempo.bpm,
            self.config.dispatch,
            Arc::clone(&self.logger),
        );

        let listener = EventListener::new(
            Arc::clone(&self.store),
            Arc::clone(&trigger),
            self.config.controls,
            self.config.input.high_pass_threshold,
            self.config.paths.history.clone(),
            Arc::clone(&self.logger),
        );
        let listener_task = {
            let signal = coordinator.signal();
            tokio::spawn(async move { listener.run(stream, signal).await })
        };
        let watcher = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.watch(interrupt).await })
        };

        let mut clock = TickClock::new(
            self.config.tempo.bpm,
            Arc::clone(&self.store),
            dispatcher,
            Arc::clone(&self.logger),
        );
        if self.config.improvisation.auto {
            self.logger.info(format!(
                "Auto-improvise after {} ticks of silence",
                self.config.improvisation.beats_of_silence
            ));
            clock = clock.with_auto_improvise(trigger);
        }

        let ticks = clock.run(coordinator.signal()).await;
        coordinator.shutdown();
        drop(clock);

        listener_task.abort();
        watcher.abort();
        worker.abort();

        let report = SessionReport {
            ticks,
            final_beat: self.store.beat(),
            notes_recorded: self.store.log_len().saturating_sub(recorded_before),
            scheduled: self.store.schedule_snapshot().len(),
        };
        self.logger.success(format!(
            "Done after {} ticks, {} notes recorded",
            report.ticks, report.notes_recorded
        ));
        Ok(report)
    }
}

#[cfg(test)]
#[path = "test_session.rs"]
mod tests;
