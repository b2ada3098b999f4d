//! Wake-word listening settings

use serde::{Deserialize, Deserializer, Serialize};

/// Wake-word listening settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeSettings {
    /// Phrases that activate command recognition.
    /// A single `wake_word = "..."` is accepted as well.
    #[serde(
        default = "default_wake_words",
        alias = "wake_word",
        deserialize_with = "one_or_many"
    )]
    pub wake_words: Vec<String>,

    /// Recognition language (BCP 47 tag)
    #[serde(default = "default_language")]
    pub language: String,

    /// Restart recognition whenever a session ends without a detection
    #[serde(default = "default_true")]
    pub continuous_listening: bool,

    /// Check partial hypotheses for the wake word
    #[serde(default = "default_true")]
    pub partial_results: bool,

    /// Check final results for the wake word
    #[serde(default = "default_true")]
    pub detect_on_final: bool,
}

fn default_wake_words() -> Vec<String> {
    vec!["hey vox".to_string()]
}

pub(super) fn default_language() -> String {
    "en-US".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(word) => vec![word],
        OneOrMany::Many(words) => words,
    })
}

impl Default for WakeSettings {
    fn default() -> Self {
        Self {
            wake_words: default_wake_words(),
            language: default_language(),
            continuous_listening: true,
            partial_results: true,
            detect_on_final: true,
        }
    }
}
