/// Generative composition: learns from the note history and writes
/// continuations for the schedule.
pub mod markov;

use std::sync::{Arc, Mutex};

use crate::engine::error::ComposeError;
use crate::engine::notes::{Beat, Note};

pub use markov::MarkovComposer;

pub trait Composer: Send {
    /// Learn from the whole history, oldest note first.
    fn train(&mut self, notes: &[Note]) -> Result<(), ComposeError>;

    /// Produce a continuation whose notes all fall after `seed_beat`.
    fn generate(&mut self, seed_beat: Beat) -> Result<Vec<Note>, ComposeError>;

    /// Whether `train` has succeeded during this session.
    fn has_trained(&self) -> bool;
}

/// A composer shared between the listener and the silence trigger.
pub type SharedComposer = Arc<Mutex<Box<dyn Composer>>>;

pub fn shared(composer: impl Composer + 'static) -> SharedComposer {
    Arc::new(Mutex::new(Box::new(composer)))
}
