pub mod session;

pub use session::{LiveSession, SessionReport};
