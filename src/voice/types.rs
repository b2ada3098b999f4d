//! Voice engine types and configuration.

use std::collections::BTreeSet;

use serde::Serialize;

use super::actions::Parameters;
use crate::error::{ErrorKind, Result, VoxError};

/// Listening state of one engine
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ListeningState {
    /// No recognition session
    #[default]
    Idle,
    /// A session is running (start acknowledged)
    Listening,
    /// Last session ended with an error
    Error(String),
}

impl ListeningState {
    pub fn is_listening(&self) -> bool {
        matches!(self, ListeningState::Listening)
    }
}

impl std::fmt::Display for ListeningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListeningState::Idle => write!(f, "Idle"),
            ListeningState::Listening => write!(f, "Listening"),
            ListeningState::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Which engine an event or state belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Wake,
    Command,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Wake => write!(f, "wake"),
            EngineKind::Command => write!(f, "command"),
        }
    }
}

/// Events raised to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VoiceEvent {
    /// A configured wake word was heard
    WakeWordDetected { wake_word: String, text: String },
    /// A command utterance matched a registered pattern
    CommandRecognized { text: String },
    /// The matching action ran
    CommandExecuted {
        pattern: String,
        parameters: Parameters,
    },
    /// An error surfaced once to the host
    Error { kind: ErrorKind, message: String },
    /// Engine listening state changed
    StateChanged {
        engine: EngineKind,
        state: ListeningState,
    },
    BackgroundModeChanged { enabled: bool },
}

impl VoiceEvent {
    pub fn error(err: &VoxError) -> Self {
        VoiceEvent::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Wake engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WakeConfig {
    wake_words: Vec<String>,
    pub language: String,
    /// Re-issue a recognition request whenever a session ends quietly
    pub continuous_listening: bool,
    /// Evaluate partial hypotheses as well as final ones
    pub partial_results: bool,
    /// Evaluate final results
    pub detect_on_final: bool,
}

impl WakeConfig {
    /// Build a config from raw wake words.
    ///
    /// Words are trimmed, lower-cased and de-duplicated; at least one
    /// non-empty word must remain.
    pub fn new<I, S>(wake_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut words = Vec::new();
        for word in wake_words {
            let normalized = normalize(word.as_ref());
            if !normalized.is_empty() && seen.insert(normalized.clone()) {
                words.push(normalized);
            }
        }
        if words.is_empty() {
            return Err(VoxError::InvalidConfig(
                "at least one non-empty wake word is required".to_string(),
            ));
        }

        Ok(Self {
            wake_words: words,
            language: "en-US".to_string(),
            continuous_listening: true,
            partial_results: true,
            detect_on_final: true,
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn continuous(mut self, continuous: bool) -> Self {
        self.continuous_listening = continuous;
        self
    }

    pub fn partial_results(mut self, enabled: bool) -> Self {
        self.partial_results = enabled;
        self
    }

    pub fn detect_on_final(mut self, enabled: bool) -> Self {
        self.detect_on_final = enabled;
        self
    }

    /// Normalized wake words
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }
}

/// Command engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CommandConfig {
    pub language: String,
    /// Force-stop the session when nothing arrives in time
    pub timeout_ms: u64,
    /// Minimum confidence for a transcript to be accepted
    pub confidence_threshold: f32,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            timeout_ms: 5000,
            confidence_threshold: 0.8,
        }
    }
}

impl CommandConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(VoxError::InvalidConfig(
                "command timeout must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(VoxError::InvalidConfig(format!(
                "confidence threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

/// Everything `VoiceController::initialize` needs
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    pub wake: WakeConfig,
    pub command: CommandConfig,
    /// Phrase registered as a built-in command that stops listening
    pub stop_phrase: Option<String>,
}

impl VoiceConfig {
    pub fn new(wake: WakeConfig) -> Self {
        Self {
            wake,
            command: CommandConfig::default(),
            stop_phrase: Some("stop listening".to_string()),
        }
    }

    pub fn with_command(mut self, command: CommandConfig) -> Self {
        self.command = command;
        self
    }

    pub fn with_stop_phrase(mut self, phrase: Option<String>) -> Self {
        self.stop_phrase = phrase;
        self
    }
}

/// Trim, lower-case and collapse inner whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
