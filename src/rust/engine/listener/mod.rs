/// Input listener: classifies every key event from the instrument, in
/// arrival order, into a control action or an ordinary note.
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::improvise::ImprovisationTrigger;
use crate::engine::instrument::InputStream;
use crate::engine::notes::{InputEvent, Note, pitch_name};
use crate::engine::shutdown::ShutdownSignal;
use crate::shared::store::SessionStore;
use crate::tools::logger::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Save,
    Replay,
    Teach,
    Improvise,
}

/// Reserved pitches and the actions they trigger on press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPitchMap {
    pub save: u8,
    pub replay: u8,
    pub teach: u8,
    pub improvise: u8,
}

impl Default for ControlPitchMap {
    fn default() -> Self {
        Self {
            save: 21,
            replay: 22,
            teach: 107,
            improvise: 108,
        }
    }
}

impl ControlPitchMap {
    /// The action bound to `pitch`, checked in priority order.
    pub fn action_for(&self, pitch: u8) -> Option<ControlAction> {
        [
            (self.save, ControlAction::Save),
            (self.replay, ControlAction::Replay),
            (self.teach, ControlAction::Teach),
            (self.improvise, ControlAction::Improvise),
        ]
        .into_iter()
        .find(|(reserved, _)| *reserved == pitch)
        .map(|(_, action)| action)
    }

    pub fn pitches(&self) -> [u8; 4] {
        [self.save, self.replay, self.teach, self.improvise]
    }
}

/// What an ordinary note does to the held-key counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEffect {
    Press,
    Release,
    /// At or below the high-pass threshold: logged, not counted.
    Uncounted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Control(ControlAction),
    /// Key-up on a control pitch. Dropped.
    ControlRelease,
    Note(KeyEffect),
}

/// Classify one event. Control pitches act on the press edge only.
pub fn classify(
    event: &InputEvent,
    controls: &ControlPitchMap,
    high_pass_threshold: u8,
) -> Classification {
    if let Some(action) = controls.action_for(event.pitch) {
        return if event.onset {
            Classification::Control(action)
        } else {
            Classification::ControlRelease
        };
    }
    if event.pitch <= high_pass_threshold {
        Classification::Note(KeyEffect::Uncounted)
    } else if event.onset {
        Classification::Note(KeyEffect::Press)
    } else {
        Classification::Note(KeyEffect::Release)
    }
}

pub struct EventListener {
    store: Arc<SessionStore>,
    trigger: Arc<ImprovisationTrigger>,
    controls: ControlPitchMap,
    high_pass_threshold: u8,
    history_path: PathBuf,
    logger: Arc<Logger>,
}

impl EventListener {
    pub fn new(
        store: Arc<SessionStore>,
        trigger: Arc<ImprovisationTrigger>,
        controls: ControlPitchMap,
        high_pass_threshold: u8,
        history_path: PathBuf,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            store,
            trigger,
            controls,
            high_pass_threshold,
            history_path,
            logger,
        }
    }

    /// Consume `stream` one event at a time until shutdown or until the
    /// instrument stops sending. An event already being handled is finished
    /// before shutdown is noticed. Returns how many events were handled.
    pub async fn run(&self, mut stream: InputStream, mut shutdown: ShutdownSignal) -> usize {
        let mut handled = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                event = stream.recv() => match event {
                    Some(event) => {
                        self.handle(event).await;
                        handled += 1;
                    }
                    None => {
                        self.logger.warn("Instrument input stream ended");
                        break;
                    }
                },
            }
        }
        handled
    }

    /// Apply one event to the session.
    pub async fn handle(&self, event: InputEvent) -> Classification {
        let classification = classify(&event, &self.controls, self.high_pass_threshold);
        match classification {
            Classification::Control(action) => self.perform(action).await,
            Classification::ControlRelease => {}
            Classification::Note(effect) => self.record(event, effect),
        }
        classification
    }

    async fn perform(&self, action: ControlAction) {
        match action {
            ControlAction::Save => self.save().await,
            ControlAction::Replay => {
                let added = self.store.replay_history();
                self.logger.info(format!(
                    "Playing back history ({} notes, {} new to the schedule)",
                    self.store.log_len(),
                    added
                ));
            }
            ControlAction::Teach => {
                self.trigger.teach().await.ok();
            }
            ControlAction::Improvise => {
                self.trigger.improvise().await.ok();
            }
        }
    }

    async fn save(&self) {
        let store = Arc::clone(&self.store);
        let path = self.history_path.clone();
        let saved = tokio::task::spawn_blocking(move || store.save_history(&path)).await;
        match saved {
            Ok(Ok(count)) => self.logger.success(format!(
                "Saved {} notes to {}",
                count,
                self.history_path.display()
            )),
            Ok(Err(err)) => self.logger.error(format!("Save failed: {err}")),
            Err(err) => self.logger.error(format!("Save task failed: {err}")),
        }
    }

    fn record(&self, event: InputEvent, effect: KeyEffect) {
        let beat = self.store.beat();
        let note: Note = event.at(beat);
        match effect {
            KeyEffect::Press => {
                self.store.key_pressed();
            }
            KeyEffect::Release => {
                self.store.key_released(beat);
            }
            KeyEffect::Uncounted => {}
        }
        self.store.append(note);
        self.logger.debug(format!(
            "Adding {} {} vel={} at beat {}",
            if note.onset { "press" } else { "release" },
            pitch_name(note.pitch),
            note.velocity,
            beat
        ));
    }
}

#[cfg(test)]
#[path = "test_listener.rs"]
mod tests;
