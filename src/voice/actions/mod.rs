//! Command actions - parameterized patterns mapped to handlers
//!
//! Recognized command text is matched against registered patterns:
//! - "open {app}" -> {app: "camera"} for "Open camera"
//! - "set volume to {level}" -> {level: "42"}
//! - "stop listening" -> exact (case-insensitive) phrase

mod pattern;
mod registry;

pub use pattern::{CommandPattern, Parameters};
pub use registry::{CommandAction, CommandRegistry, Resolution, SharedRegistry};

#[cfg(test)]
mod tests;
