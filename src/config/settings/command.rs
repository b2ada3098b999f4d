//! Command recognition settings

use serde::{Deserialize, Serialize};

use super::wake::default_language;

/// Command recognition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSettings {
    /// Recognition language (BCP 47 tag)
    #[serde(default = "default_language")]
    pub language: String,

    /// Give up on a command after this many milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Minimum confidence (0.0-1.0) for a transcript to be accepted
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Built-in phrase that stops listening. Empty disables it.
    #[serde(default = "default_stop_phrase")]
    pub stop_phrase: Option<String>,
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_confidence_threshold() -> f32 {
    0.8
}

fn default_stop_phrase() -> Option<String> {
    Some("stop listening".to_string())
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            language: default_language(),
            timeout_ms: default_timeout_ms(),
            confidence_threshold: default_confidence_threshold(),
            stop_phrase: default_stop_phrase(),
        }
    }
}

/// A `[[commands]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEntry {
    /// Pattern text, e.g. "open {app}"
    pub pattern: String,

    /// Placeholder names; empty means "take them from the pattern"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}
