use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("no MIDI {direction} port available")]
    NoPort { direction: &'static str },

    #[error("MIDI {direction} port index {index} out of range ({available} ports)")]
    PortOutOfRange {
        direction: &'static str,
        index: usize,
        available: usize,
    },

    #[error("MIDI connection failed: {0}")]
    Connection(String),

    #[error("instrument is closed")]
    Closed,

    #[error("input stream was already taken; it cannot be restarted")]
    AlreadyListening,

    #[error("playback failed: {0}")]
    Playback(String),
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history file {} not found", path.display())]
    Missing { path: PathBuf },

    #[error("failed to access history file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported history version {found} in {}", path.display())]
    Version { path: PathBuf, found: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("not enough history to learn from: {found} qualifying notes, need {needed}")]
    NotEnoughHistory { found: usize, needed: usize },

    #[error("the composer has not been trained this session")]
    Untrained,

    #[error("composer task failed: {0}")]
    Task(String),
}
