/// The instrument the session plays with: where key events come from and
/// where scheduled notes go.
#[cfg(feature = "cli")]
pub mod midi_native;
pub mod virtual_device;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::engine::error::InstrumentError;
use crate::engine::notes::{InputEvent, NoteSet};

#[cfg(feature = "cli")]
pub use midi_native::MidiInstrument;
pub use virtual_device::{VirtualInstrument, VirtualKeyboard};

/// Key events in arrival order. Never ends on its own.
pub type InputStream = UnboundedReceiver<InputEvent>;

/// An opened instrument. Opening is the implementor's constructor; a value
/// of this trait is always a live handle until `close` is called.
#[async_trait]
pub trait Instrument: Send + Sync {
    /// Take the input stream. It can only be taken once.
    fn listen(&self) -> Result<InputStream, InstrumentError>;

    /// Sound `notes` at tempo `bpm`. Returns once the notes have been held
    /// for their duration.
    async fn play(&self, notes: NoteSet, bpm: u32) -> Result<(), InstrumentError>;

    /// Release the device. Plays issued after this fail with `Closed`.
    fn close(&self) -> Result<(), InstrumentError>;
}
