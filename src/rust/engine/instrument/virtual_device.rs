// In-process instrument.
// Responsibilities:
// - hand out a keyboard that injects key events into the input stream
// - record every note set it is asked to play
// - optionally echo played notes through the logger (`duet play --virtual`)
// - let callers force playback failures and slow playback down

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedSender};

use super::{InputStream, Instrument};
use crate::engine::error::InstrumentError;
use crate::engine::notes::{InputEvent, NoteSet, pitch_name};
use crate::tools::logger::Logger;

#[derive(Default)]
struct VirtualState {
    played: Mutex<Vec<NoteSet>>,
    close_calls: AtomicUsize,
    closed: AtomicBool,
    fail_playback: AtomicBool,
    play_delay: Mutex<Duration>,
}

pub struct VirtualInstrument {
    keys: UnboundedSender<InputEvent>,
    stream: Mutex<Option<InputStream>>,
    state: Arc<VirtualState>,
    echo: Option<Arc<Logger>>,
}

/// Injects key events into a `VirtualInstrument`.
#[derive(Clone)]
pub struct VirtualKeyboard {
    keys: UnboundedSender<InputEvent>,
}

impl VirtualInstrument {
    pub fn new() -> Self {
        let (keys, stream) = mpsc::unbounded_channel();
        Self {
            keys,
            stream: Mutex::new(Some(stream)),
            state: Arc::new(VirtualState::default()),
            echo: None,
        }
    }

    /// Log every played note set at action level.
    pub fn with_echo(mut self, logger: Arc<Logger>) -> Self {
        self.echo = Some(logger);
        self
    }

    pub fn keyboard(&self) -> VirtualKeyboard {
        VirtualKeyboard {
            keys: self.keys.clone(),
        }
    }

    pub fn played(&self) -> Vec<NoteSet> {
        self.state
            .played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn close_calls(&self) -> usize {
        self.state.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn fail_playback(&self, fail: bool) {
        self.state.fail_playback.store(fail, Ordering::SeqCst);
    }

    /// Make every play call hold for `delay` before returning.
    pub fn set_play_delay(&self, delay: Duration) {
        *self
            .state
            .play_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }
}

impl Default for VirtualInstrument {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Instrument for VirtualInstrument {
    fn listen(&self) -> Result<InputStream, InstrumentError> {
        self.stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(InstrumentError::AlreadyListening)
    }

    async fn play(&self, notes: NoteSet, _bpm: u32) -> Result<(), InstrumentError> {
        let delay = *self
            .state
            .play_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(InstrumentError::Closed);
        }
        if self.state.fail_playback.load(Ordering::SeqCst) {
            return Err(InstrumentError::Playback("virtual playback failure".into()));
        }
        if let Some(logger) = &self.echo {
            let names: Vec<String> = notes
                .iter()
                .map(|n| format!("{}{}", if n.onset { "+" } else { "-" }, pitch_name(n.pitch)))
                .collect();
            logger.action(format!("play {}", names.join(" ")));
        }
        self.state
            .played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notes);
        Ok(())
    }

    fn close(&self) -> Result<(), InstrumentError> {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.closed.swap(true, Ordering::SeqCst) {
            return Err(InstrumentError::Closed);
        }
        Ok(())
    }
}

impl VirtualKeyboard {
    pub fn send(&self, event: InputEvent) -> bool {
        self.keys.send(event).is_ok()
    }

    pub fn press(&self, pitch: u8, velocity: u8) -> bool {
        self.send(InputEvent::press(pitch, velocity))
    }

    pub fn release(&self, pitch: u8) -> bool {
        self.send(InputEvent::release(pitch))
    }
}

/// Parse a typed keyboard line: `on <pitch> [velocity]` or `off <pitch>`.
/// Velocity defaults to 100.
pub fn parse_keyboard_line(line: &str) -> Option<InputEvent> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?.to_ascii_lowercase();
    let pitch: u8 = parts.next()?.parse().ok().filter(|p| *p <= 127)?;
    match verb.as_str() {
        "on" | "+" => {
            let velocity = match parts.next() {
                Some(raw) => raw.parse().ok().filter(|v: &u8| (1..=127).contains(v))?,
                None => 100,
            };
            Some(InputEvent::press(pitch, velocity))
        }
        "off" | "-" => Some(InputEvent::release(pitch)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "test_virtual_device.rs"]
mod tests;
