/// State shared between concurrently running session tasks
pub mod debugger;
pub mod store;

pub use debugger::DebugTimer;
pub use store::{Counters, SessionStore};
