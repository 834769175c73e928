/// Append-ordered record of every note received, and its JSON file.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::error::HistoryError;
use crate::engine::notes::{Beat, Note};
use crate::tools::logger::Logger;

pub const HISTORY_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteLog {
    notes: Vec<Note>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    notes: Vec<Note>,
}

/// Shape of a saved history, for `duet history show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySummary {
    pub notes: usize,
    pub presses: usize,
    pub first_beat: Beat,
    pub last_beat: Beat,
    pub lowest_pitch: u8,
    pub highest_pitch: u8,
}

impl NoteLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn summary(&self) -> Option<HistorySummary> {
        let first = self.notes.first()?;
        let mut summary = HistorySummary {
            notes: self.notes.len(),
            presses: 0,
            first_beat: first.beat,
            last_beat: first.beat,
            lowest_pitch: first.pitch,
            highest_pitch: first.pitch,
        };
        for note in &self.notes {
            if note.onset {
                summary.presses += 1;
            }
            summary.first_beat = summary.first_beat.min(note.beat);
            summary.last_beat = summary.last_beat.max(note.beat);
            summary.lowest_pitch = summary.lowest_pitch.min(note.pitch);
            summary.highest_pitch = summary.highest_pitch.max(note.pitch);
        }
        Some(summary)
    }

    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => HistoryError::Missing {
                path: path.to_path_buf(),
            },
            _ => HistoryError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let file: HistoryFile =
            serde_json::from_str(&raw).map_err(|source| HistoryError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        if file.version != HISTORY_VERSION {
            return Err(HistoryError::Version {
                path: path.to_path_buf(),
                found: file.version,
            });
        }
        Ok(Self { notes: file.notes })
    }

    /// Load the history at `path`, falling back to an empty log with a warning.
    pub fn load_or_empty(path: &Path, logger: &Logger) -> Self {
        match Self::load(path) {
            Ok(log) => {
                logger.info(format!(
                    "Loaded previous music history ({} notes) from {}",
                    log.len(),
                    path.display()
                ));
                log
            }
            Err(err) => {
                logger.warn(format!("{err}; starting with an empty history"));
                Self::new()
            }
        }
    }

    /// Overwrite `path` with this log. Writes a sibling temp file first and
    /// renames it over the target, so readers never see a partial file.
    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        let file = HistoryFile {
            version: HISTORY_VERSION,
            notes: self.notes.clone(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| HistoryError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        let io_err = |source: std::io::Error| HistoryError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = temp_path(path);
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }
}

impl From<Vec<Note>> for NoteLog {
    fn from(notes: Vec<Note>) -> Self {
        Self { notes }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "history".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "test_history.rs"]
mod tests;
