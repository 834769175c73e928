/// Real-time engine: the 1/64-beat clock, note dispatch, the input listener
/// and the collaborators they talk to.
pub mod clock;
pub mod composer;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod improvise;
pub mod instrument;
pub mod listener;
pub mod notes;
pub mod schedule;
pub mod shutdown;

pub use notes::{Beat, InputEvent, Note, NoteSet};
