// First-order Markov composer.
//
// Learns from the presses above the high-pass threshold:
// - pitch -> next pitch transition counts
// - gaps between consecutive presses (in ticks)
// - how long each key was held (press to matching release)
// - press velocities
//
// A continuation walks the pitch chain from a random learned pitch, spacing
// presses with sampled gaps and closing each one with a release after a
// sampled hold length.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::Composer;
use crate::engine::error::ComposeError;
use crate::engine::notes::{Beat, Note, TICKS_PER_BEAT};

/// Next pitch -> weight (unnormalized count).
type TransitionTable = BTreeMap<u8, f64>;

const MIN_PRESSES: usize = 2;
const DEFAULT_HOLD: Beat = TICKS_PER_BEAT / 2;
const MAX_GAP: Beat = 4 * TICKS_PER_BEAT;

pub struct MarkovComposer {
    high_pass_threshold: u8,
    phrase_length: usize,
    rng: StdRng,
    transitions: BTreeMap<u8, TransitionTable>,
    pitches: Vec<u8>,
    gaps: Vec<Beat>,
    holds: Vec<Beat>,
    velocities: Vec<u8>,
    trained: bool,
}

impl MarkovComposer {
    pub fn new(high_pass_threshold: u8, phrase_length: usize) -> Self {
        Self::with_rng(high_pass_threshold, phrase_length, StdRng::from_entropy())
    }

    /// Deterministic composer for reproducible output.
    pub fn seeded(high_pass_threshold: u8, phrase_length: usize, seed: u64) -> Self {
        Self::with_rng(
            high_pass_threshold,
            phrase_length,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(high_pass_threshold: u8, phrase_length: usize, rng: StdRng) -> Self {
        Self {
            high_pass_threshold,
            phrase_length: phrase_length.max(1),
            rng,
            transitions: BTreeMap::new(),
            pitches: Vec::new(),
            gaps: Vec::new(),
            holds: Vec::new(),
            velocities: Vec::new(),
            trained: false,
        }
    }

    /// Learned transition weights out of `pitch`.
    pub fn transitions_from(&self, pitch: u8) -> Option<&BTreeMap<u8, f64>> {
        self.transitions.get(&pitch)
    }

    fn next_pitch(&mut self, current: u8) -> u8 {
        let roll: f64 = self.rng.r#gen();
        self.transitions
            .get(&current)
            .and_then(|table| sample_from_table(table, roll))
            .or_else(|| self.pitches.choose(&mut self.rng).copied())
            .unwrap_or(current)
    }

    fn pick(values: &[Beat], rng: &mut StdRng, fallback: Beat) -> Beat {
        values.choose(rng).copied().unwrap_or(fallback)
    }
}

impl Composer for MarkovComposer {
    fn train(&mut self, notes: &[Note]) -> Result<(), ComposeError> {
        let presses: Vec<(usize, &Note)> = notes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.onset && n.pitch > self.high_pass_threshold)
            .collect();
        if presses.len() < MIN_PRESSES {
            return Err(ComposeError::NotEnoughHistory {
                found: presses.len(),
                needed: MIN_PRESSES,
            });
        }

        let mut transitions: BTreeMap<u8, TransitionTable> = BTreeMap::new();
        let mut gaps = Vec::new();
        for pair in presses.windows(2) {
            let (from, to) = (pair[0].1, pair[1].1);
            *transitions
                .entry(from.pitch)
                .or_default()
                .entry(to.pitch)
                .or_insert(0.0) += 1.0;
            // Replays rewind the clock, so a later press can carry an earlier beat.
            if to.beat > from.beat {
                gaps.push((to.beat - from.beat).min(MAX_GAP));
            }
        }

        let mut holds = Vec::new();
        for (index, press) in &presses {
            let release = notes[index + 1..]
                .iter()
                .find(|n| n.is_release() && n.pitch == press.pitch);
            if let Some(release) = release.filter(|r| r.beat > press.beat) {
                holds.push(release.beat - press.beat);
            }
        }

        self.transitions = transitions;
        self.pitches = presses.iter().map(|(_, n)| n.pitch).collect();
        self.velocities = presses.iter().map(|(_, n)| n.velocity).collect();
        self.gaps = gaps;
        self.holds = holds;
        self.trained = true;
        Ok(())
    }

    fn generate(&mut self, seed_beat: Beat) -> Result<Vec<Note>, ComposeError> {
        if !self.trained {
            return Err(ComposeError::Untrained);
        }
        let mut pitch = *self
            .pitches
            .choose(&mut self.rng)
            .ok_or(ComposeError::Untrained)?;
        let mut beat = seed_beat + Self::pick(&self.gaps, &mut self.rng, TICKS_PER_BEAT).max(1);
        let mut phrase = Vec::with_capacity(self.phrase_length * 2);

        for _ in 0..self.phrase_length {
            let velocity = self.velocities.choose(&mut self.rng).copied().unwrap_or(80);
            let hold = Self::pick(&self.holds, &mut self.rng, DEFAULT_HOLD).max(1);
            phrase.push(Note::press(pitch, velocity.max(1), beat));
            phrase.push(Note::release(pitch, beat + hold));

            beat += Self::pick(&self.gaps, &mut self.rng, TICKS_PER_BEAT).max(1);
            pitch = self.next_pitch(pitch);
        }
        Ok(phrase)
    }

    fn has_trained(&self) -> bool {
        self.trained
    }
}

/// Sample a key from a weight table using a random value in [0, 1).
fn sample_from_table(table: &TransitionTable, roll: f64) -> Option<u8> {
    let total: f64 = table.values().sum();
    if total <= 0.0 {
        return None;
    }
    let target = roll * total;
    let mut cumulative = 0.0;
    for (&pitch, &weight) in table {
        cumulative += weight;
        if cumulative > target {
            return Some(pitch);
        }
    }
    table.keys().next_back().copied()
}

#[cfg(test)]
#[path = "test_markov.rs"]
mod tests;
