/// Notes, input events and the tick unit they are stamped with.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One tick: 1/64 of a beat at the session tempo.
pub type Beat = u64;

/// Ticks per beat.
pub const TICKS_PER_BEAT: u64 = 64;

/// Highest valid MIDI pitch or velocity.
pub const MIDI_MAX: u8 = 127;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;

/// A set of notes sharing a beat. Ordered so playback is deterministic.
pub type NoteSet = BTreeSet<Note>;

/// A key event stamped with the tick it happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub velocity: u8,
    /// `true` for a key press, `false` for a release (velocity 0).
    #[serde(rename = "on")]
    pub onset: bool,
    pub beat: Beat,
}

impl Note {
    pub fn press(pitch: u8, velocity: u8, beat: Beat) -> Self {
        Self {
            pitch,
            velocity,
            onset: true,
            beat,
        }
    }

    pub fn release(pitch: u8, beat: Beat) -> Self {
        Self {
            pitch,
            velocity: 0,
            onset: false,
            beat,
        }
    }

    pub fn is_release(&self) -> bool {
        !self.onset
    }

    /// Raw MIDI bytes for this note on `channel` (0-15).
    pub fn midi_message(&self, channel: u8) -> [u8; 3] {
        let status = if self.onset { NOTE_ON } else { NOTE_OFF };
        [
            status | (channel & 0x0F),
            self.pitch.min(MIDI_MAX),
            self.velocity.min(MIDI_MAX),
        ]
    }
}

/// A raw key event as delivered by the instrument, before it is stamped with a beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub pitch: u8,
    pub velocity: u8,
    pub onset: bool,
}

impl InputEvent {
    pub fn press(pitch: u8, velocity: u8) -> Self {
        Self {
            pitch,
            velocity,
            onset: velocity > 0,
        }
    }

    pub fn release(pitch: u8) -> Self {
        Self {
            pitch,
            velocity: 0,
            onset: false,
        }
    }

    /// Decode a note-on / note-off MIDI message. A note-on with velocity 0 is a
    /// release; clock, controller and other messages yield `None`.
    pub fn from_midi(message: &[u8]) -> Option<Self> {
        let (&status, rest) = message.split_first()?;
        let (&pitch, rest) = rest.split_first()?;
        let velocity = rest.first().copied().unwrap_or(0);
        match status & 0xF0 {
            NOTE_ON if velocity > 0 => Some(Self {
                pitch: pitch & MIDI_MAX,
                velocity: velocity & MIDI_MAX,
                onset: true,
            }),
            NOTE_ON | NOTE_OFF => Some(Self::release(pitch & MIDI_MAX)),
            _ => None,
        }
    }

    pub fn at(self, beat: Beat) -> Note {
        Note {
            pitch: self.pitch,
            velocity: if self.onset { self.velocity } else { 0 },
            onset: self.onset,
            beat,
        }
    }
}

/// Scientific pitch name, e.g. 60 -> "C4".
pub fn pitch_name(pitch: u8) -> String {
    let names = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = (pitch as i32 / 12) - 1;
    let name = names[(pitch % 12) as usize];
    format!("{}{}", name, octave)
}

#[cfg(test)]
#[path = "test_notes.rs"]
mod tests;
