//! Settings configuration types

mod command;
mod wake;

pub use command::{CommandEntry, CommandSettings};
pub use wake::WakeSettings;
