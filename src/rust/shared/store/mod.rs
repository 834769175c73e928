/// Session store - the state shared by the clock, dispatcher, listener and trigger.
///
/// Lock order: `counters` -> `schedule` -> `log`. A task holding one of
/// these may only acquire locks that come after it. The beat counter is an
/// atomic and sits outside the order. No guard is ever held across an
/// `.await`.
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::error::HistoryError;
use crate::engine::history::NoteLog;
use crate::engine::notes::{Beat, Note, NoteSet};
use crate::engine::schedule::NoteSchedule;

/// Key and activity counters, always read and written together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Keys above the high-pass threshold currently held down.
    pub pressed_keys: u32,
    /// Beat of the last qualifying release or of the last dispatch that played notes.
    pub last_activity: Beat,
    /// `last_activity` value at which the silence trigger last fired.
    pub improvised_at: Option<Beat>,
}

/// Shared state for one playing session.
#[derive(Debug, Default)]
pub struct SessionStore {
    beat: AtomicU64,
    counters: Mutex<Counters>,
    schedule: RwLock<NoteSchedule>,
    log: RwLock<NoteLog>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(log: NoteLog) -> Self {
        Self {
            log: RwLock::new(log),
            ..Self::default()
        }
    }

    pub fn beat(&self) -> Beat {
        self.beat.load(Ordering::Acquire)
    }

    /// Advance the beat counter by one tick and return the new beat.
    pub fn advance_beat(&self) -> Beat {
        self.beat.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn reset_beat(&self) {
        self.beat.store(0, Ordering::Release);
    }

    pub fn counters(&self) -> Counters {
        *self.lock_counters()
    }

    /// Count a press above the threshold. Returns the new held-key count.
    pub fn key_pressed(&self) -> u32 {
        let mut counters = self.lock_counters();
        counters.pressed_keys = counters.pressed_keys.saturating_add(1);
        counters.pressed_keys
    }

    /// Count a release above the threshold at `beat`. Unmatched releases
    /// leave the count at zero. Returns the new held-key count.
    pub fn key_released(&self, beat: Beat) -> u32 {
        let mut counters = self.lock_counters();
        counters.pressed_keys = counters.pressed_keys.saturating_sub(1);
        counters.last_activity = beat;
        counters.pressed_keys
    }

    pub fn mark_activity(&self, beat: Beat) {
        self.lock_counters().last_activity = beat;
    }

    /// Hold off the silence trigger until `until`. A grace period is not
    /// activity: if the trigger already fired for the current activity it
    /// stays disarmed.
    pub fn grant_grace(&self, until: Beat) {
        let mut counters = self.lock_counters();
        let fired = counters.improvised_at == Some(counters.last_activity);
        counters.last_activity = until;
        if fired {
            counters.improvised_at = Some(until);
        }
    }

    /// Claim the silence trigger. Succeeds when more than `beats_of_silence`
    /// ticks have passed since the last activity, no key is held, and the
    /// trigger has not already fired for this activity beat. Returns the
    /// beat the claim was made at.
    pub fn claim_silence(&self, beats_of_silence: Beat) -> Option<Beat> {
        let mut counters = self.lock_counters();
        let beat = self.beat();
        let silence = beat.saturating_sub(counters.last_activity);
        let armed = counters.improvised_at != Some(counters.last_activity);
        if silence > beats_of_silence && counters.pressed_keys == 0 && armed {
            counters.improvised_at = Some(counters.last_activity);
            Some(beat)
        } else {
            None
        }
    }

    pub fn notes_at(&self, beat: Beat) -> Option<NoteSet> {
        self.read_schedule().get(beat).cloned()
    }

    /// Per-beat union of `notes` into the schedule. Returns how many were new.
    pub fn schedule_notes<I>(&self, notes: I) -> usize
    where
        I: IntoIterator<Item = Note>,
    {
        self.write_schedule().merge(notes)
    }

    pub fn schedule_snapshot(&self) -> NoteSchedule {
        self.read_schedule().clone()
    }

    pub fn append(&self, note: Note) {
        self.write_log().push(note);
    }

    pub fn log_snapshot(&self) -> NoteLog {
        self.read_log().clone()
    }

    pub fn log_len(&self) -> usize {
        self.read_log().len()
    }

    /// Schedule every logged note at its recorded beat, then rewind the beat
    /// counter to zero. Returns how many notes were scheduled for the first time.
    pub fn replay_history(&self) -> usize {
        let added = {
            let mut schedule = self.write_schedule();
            let log = self.read_log();
            schedule.merge(log.iter().copied())
        };
        self.reset_beat();
        added
    }

    /// Write a consistent snapshot of the log to `path`. Appends that race
    /// with the save land either wholly in the snapshot or wholly after it.
    pub fn save_history(&self, path: &Path) -> Result<usize, HistoryError> {
        let snapshot = self.log_snapshot();
        snapshot.save(path)?;
        Ok(snapshot.len())
    }

    fn lock_counters(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_schedule(&self) -> RwLockReadGuard<'_, NoteSchedule> {
        self.schedule.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_schedule(&self) -> RwLockWriteGuard<'_, NoteSchedule> {
        self.schedule.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_log(&self) -> RwLockReadGuard<'_, NoteLog> {
        self.log.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_log(&self) -> RwLockWriteGuard<'_, NoteLog> {
        self.log.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "test_shared_store.rs"]
mod tests;
