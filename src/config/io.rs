//! Configuration file I/O operations

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::Config;

/// Default configuration content for `vox init`
pub const DEFAULT_CONFIG: &str = r#"# Vox Configuration
# ==================
#
# Say a wake word, then a command. Commands are matched against the
# patterns below; `{name}` captures one word.

# Keep listening while the host app is in the background
background_mode = false

[wake]
# One or more wake phrases (matched anywhere in what was heard, any case)
wake_words = ["hey vox"]
language = "en-US"
# Restart recognition automatically after silence or a non-matching phrase
continuous_listening = true
# Check in-progress hypotheses, not only final results
partial_results = true
detect_on_final = true

[command]
language = "en-US"
# Give up on a command after this many milliseconds
timeout_ms = 5000
# Transcripts below this confidence (0.0-1.0) are ignored
confidence_threshold = 0.8
# Saying this phrase as a command stops listening ("" disables it)
stop_phrase = "stop listening"

[[commands]]
pattern = "open {app}"

[[commands]]
pattern = "set volume to {level}"
parameters = ["level"]
"#;

impl Config {
    /// Get the global config directory path (~/.vox/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vox")
    }

    /// Get the global config file path (~/.vox/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load `path` (or the global config), falling back to defaults when the
    /// file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::global_config_path);

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Save configuration to a file with an atomic write (temp file + rename).
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;
        write_atomic(path, &content)
    }

    /// Write the commented default config. Refuses to overwrite unless `force`.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "Configuration already exists: {}\nUse --force to overwrite.",
                path.display()
            );
        }
        write_atomic(path, DEFAULT_CONFIG)
    }
}

/// Write through a sibling temp file and rename it over `path`.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("toml.tmp");
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| "Failed to write config content")?;

    temp_file
        .sync_all()
        .with_context(|| "Failed to sync config file")?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename config file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.wake.wake_words, vec!["hey vox".to_string()]);
        assert_eq!(config.commands.len(), 2);
        assert!(config.voice_config().is_ok());
    }
}
