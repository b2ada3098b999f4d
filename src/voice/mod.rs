//! Hands-free voice interaction
//!
//! This module provides:
//! 1. Wake-word detection in continuous listening mode
//! 2. Hand-off to single-shot command recognition after a detection
//! 3. Command patterns with `{name}` placeholders mapped to host actions
//!
//! Architecture:
//! - ListeningSession: session lifecycle and identity shared by both engines
//! - WakeEngine: substring wake-word matching with automatic restart
//! - CommandEngine: confidence gate, timeout and dispatch to the registry
//! - VoiceController: the host-facing handle; a driver task serializes
//!   both engines so at most one of them listens at any time

pub mod actions;
pub mod command;
pub mod controller;
pub mod session;
mod types;
pub mod wake;


pub use actions::{
    CommandAction, CommandPattern, CommandRegistry, Parameters, Resolution, SharedRegistry,
};
pub use command::{CommandEngine, CommandOutcome};
pub use controller::{ListeningSnapshot, StateWatch, VoiceController};
pub use types::{
    CommandConfig, EngineKind, ListeningState, VoiceConfig, VoiceEvent, WakeConfig, normalize,
};
pub use wake::{WakeEngine, WakeOutcome};
