//! Configuration loading and management

mod io;
mod settings;

pub use settings::{CommandEntry, CommandSettings, WakeSettings};
pub use io::DEFAULT_CONFIG;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::voice::{CommandConfig, VoiceConfig, WakeConfig};

/// Main configuration structure (`~/.vox/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Keep recognizing while the host runs in the background
    #[serde(default)]
    pub background_mode: bool,

    /// Wake-word listening
    #[serde(default)]
    pub wake: WakeSettings,

    /// Command recognition
    #[serde(default)]
    pub command: CommandSettings,

    /// Commands registered at start-up
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
}

impl Config {
    /// Validate and convert into the controller's runtime configuration.
    pub fn voice_config(&self) -> Result<VoiceConfig> {
        let wake = WakeConfig::new(&self.wake.wake_words)?
            .with_language(self.wake.language.clone())
            .continuous(self.wake.continuous_listening)
            .partial_results(self.wake.partial_results)
            .detect_on_final(self.wake.detect_on_final);

        let command = CommandConfig {
            language: self.command.language.clone(),
            timeout_ms: self.command.timeout_ms,
            confidence_threshold: self.command.confidence_threshold,
        };
        command.validate()?;

        let stop_phrase = self
            .command
            .stop_phrase
            .as_deref()
            .map(str::trim)
            .filter(|phrase| !phrase.is_empty())
            .map(str::to_string);

        Ok(VoiceConfig::new(wake)
            .with_command(command)
            .with_stop_phrase(stop_phrase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoxError;

    #[test]
    fn test_defaults_match_documented_values() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.wake.wake_words, vec!["hey vox".to_string()]);
        assert_eq!(config.command.timeout_ms, 5000);
        assert_eq!(config.command.confidence_threshold, 0.8);
        assert_eq!(config.command.stop_phrase.as_deref(), Some("stop listening"));
        assert!(!config.background_mode);
        assert!(config.commands.is_empty());
    }

    #[test]
    fn test_single_wake_word_is_accepted() {
        let config: Config = toml::from_str(
            r#"
            [wake]
            wake_word = "Computer"
            "#,
        )
        .unwrap();
        assert_eq!(config.wake.wake_words, vec!["Computer".to_string()]);

        let voice = config.voice_config().unwrap();
        assert_eq!(voice.wake.wake_words(), ["computer"]);
    }

    #[test]
    fn test_commands_section_parses() {
        let config: Config = toml::from_str(
            r#"
            [[commands]]
            pattern = "open {app}"

            [[commands]]
            pattern = "set volume to {level}"
            parameters = ["level"]
            "#,
        )
        .unwrap();
        assert_eq!(config.commands.len(), 2);
        assert!(config.commands[0].parameters.is_empty());
        assert_eq!(config.commands[1].parameters, vec!["level".to_string()]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::default();
        config.command.confidence_threshold = 1.5;
        assert!(matches!(
            config.voice_config(),
            Err(VoxError::InvalidConfig(_))
        ));

        let mut config = Config::default();
        config.command.timeout_ms = 0;
        assert!(matches!(
            config.voice_config(),
            Err(VoxError::InvalidConfig(_))
        ));

        let mut config = Config::default();
        config.wake.wake_words = vec!["   ".to_string()];
        assert!(matches!(
            config.voice_config(),
            Err(VoxError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_blank_stop_phrase_disables_it() {
        let mut config = Config::default();
        config.command.stop_phrase = Some("  ".to_string());
        assert_eq!(config.voice_config().unwrap().stop_phrase, None);
    }
}
