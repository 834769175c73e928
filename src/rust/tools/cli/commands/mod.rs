pub mod devices;
pub mod history;
pub mod play;
