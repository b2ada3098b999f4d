//! Vox - hands-free voice commands
//!
//! Vox listens for a wake word, then recognizes one spoken command and maps
//! it onto a registered action. Commands are plain phrases with `{name}`
//! placeholders ("set volume to {level}") whose captured words are handed
//! to the action.
//!
//! ## Pieces
//!
//! 1. **Speech engine**: a [`speech::SpeechEngine`] turns audio into
//!    recognition callbacks. [`speech::ManualSpeechEngine`] is driven by
//!    typed input instead of a microphone.
//!
//! 2. **Controller**: [`voice::VoiceController`] alternates between
//!    wake-word listening and command recognition and reports what happened
//!    as [`voice::VoiceEvent`]s.

pub mod audio;
pub mod config;
pub mod error;
pub mod speech;
pub mod voice;

pub use error::{ErrorKind, Result, VoxError};
pub use voice::{
    CommandAction, CommandPattern, ListeningState, Parameters, VoiceConfig, VoiceController,
    VoiceEvent, WakeConfig,
};
