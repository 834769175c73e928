use std::collections::BTreeMap;

use crate::engine::notes::{Beat, Note, NoteSet};

/// Notes waiting to be played, keyed by the beat they fire on.
///
/// Writes are unions: adding a note never removes or replaces what is
/// already scheduled, and nothing is ever taken out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteSchedule {
    beats: BTreeMap<Beat, NoteSet>,
}

impl NoteSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `note` at its own beat. Returns false if it was already there.
    pub fn add(&mut self, note: Note) -> bool {
        self.beats.entry(note.beat).or_default().insert(note)
    }

    /// Per-beat union of `notes` into the schedule. Returns how many were new.
    pub fn merge<I>(&mut self, notes: I) -> usize
    where
        I: IntoIterator<Item = Note>,
    {
        notes.into_iter().filter(|note| self.add(*note)).count()
    }

    pub fn get(&self, beat: Beat) -> Option<&NoteSet> {
        self.beats.get(&beat).filter(|set| !set.is_empty())
    }

    pub fn contains(&self, note: &Note) -> bool {
        self.beats
            .get(&note.beat)
            .is_some_and(|set| set.contains(note))
    }

    /// Total number of scheduled notes.
    pub fn len(&self) -> usize {
        self.beats.values().map(|set| set.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn beat_count(&self) -> usize {
        self.beats.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Beat, &NoteSet)> {
        self.beats.iter()
    }
}

#[cfg(test)]
#[path = "test_schedule.rs"]
mod tests;
