/// Silence-triggered improvisation, plus the teach/improvise steps the
/// control pitches call directly.
use std::sync::{Arc, PoisonError};

use serde::{Deserialize, Serialize};

use crate::engine::composer::SharedComposer;
use crate::engine::error::ComposeError;
use crate::engine::notes::{Beat, Note, TICKS_PER_BEAT};
use crate::shared::debugger::DebugTimer;
use crate::shared::store::SessionStore;
use crate::tools::logger::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprovisationSettings {
    /// Ticks of silence, with no key held, before the composer takes over.
    pub beats_of_silence: Beat,
    /// Evaluate the silence condition on every tick.
    pub auto: bool,
    /// Ticks after a lesson before silence starts counting again.
    pub teach_grace: Beat,
    /// Presses per generated phrase.
    pub phrase_length: usize,
}

impl Default for ImprovisationSettings {
    fn default() -> Self {
        Self {
            beats_of_silence: 4 * TICKS_PER_BEAT,
            auto: false,
            teach_grace: 4 * TICKS_PER_BEAT,
            phrase_length: 16,
        }
    }
}

pub struct ImprovisationTrigger {
    store: Arc<SessionStore>,
    composer: SharedComposer,
    settings: ImprovisationSettings,
    logger: Arc<Logger>,
}

impl ImprovisationTrigger {
    pub fn new(
        store: Arc<SessionStore>,
        composer: SharedComposer,
        settings: ImprovisationSettings,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            store,
            composer,
            settings,
            logger,
        }
    }

    pub fn settings(&self) -> ImprovisationSettings {
        self.settings
    }

    /// Check the silence condition and, when it holds and has not already
    /// fired for the current activity, start an improvisation in the
    /// background. Never waits. Returns whether it fired.
    pub fn evaluate(self: &Arc<Self>) -> bool {
        let Some(beat) = self.store.claim_silence(self.settings.beats_of_silence) else {
            return false;
        };
        self.logger
            .info(format!("Silence since beat {}, improvising", beat));
        let trigger = Arc::clone(self);
        tokio::spawn(async move {
            trigger.improvise().await.ok();
        });
        true
    }

    /// Train the composer on the full history and give the player a grace
    /// period before silence counts again.
    pub async fn teach(&self) -> Result<(), ComposeError> {
        let notes: Vec<Note> = self.store.log_snapshot().notes().to_vec();
        self.store
            .grant_grace(self.store.beat() + self.settings.teach_grace);
        self.logger
            .info(format!("Sending {} notes of history to the composer", notes.len()));

        let composer = Arc::clone(&self.composer);
        let timer = DebugTimer::new("training", Arc::clone(&self.logger));
        let result = tokio::task::spawn_blocking(move || {
            composer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .train(&notes)
        })
        .await
        .unwrap_or_else(|join| Err(ComposeError::Task(join.to_string())));
        drop(timer);

        match &result {
            Ok(()) => self.logger.success("Composer trained"),
            Err(err) => self.logger.warn(format!("Training failed: {err}")),
        }
        result
    }

    /// Generate a continuation seeded at the current beat and merge it into
    /// the schedule. Trains first when the composer has not learned yet.
    /// Returns how many notes were newly scheduled.
    pub async fn improvise(&self) -> Result<usize, ComposeError> {
        if !self.has_trained() {
            self.teach().await?;
        }

        let seed = self.store.beat();
        let composer = Arc::clone(&self.composer);
        let generated = tokio::task::spawn_blocking(move || {
            composer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .generate(seed)
        })
        .await
        .unwrap_or_else(|join| Err(ComposeError::Task(join.to_string())));

        match generated {
            Ok(notes) => {
                let added = self.store.schedule_notes(notes);
                self.logger
                    .info(format!("Added {added} notes from the composer"));
                Ok(added)
            }
            Err(err) => {
                self.logger.error(format!("Improvisation failed: {err}"));
                Err(err)
            }
        }
    }

    pub fn has_trained(&self) -> bool {
        self.composer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .has_trained()
    }
}

#[cfg(test)]
#[path = "test_improvise.rs"]
mod tests;
