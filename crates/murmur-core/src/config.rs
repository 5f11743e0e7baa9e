use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MurmurError, Result};

/// Top-level configuration for the Murmur application.
///
/// Loaded from `~/.murmur/config.toml` by default. Each section corresponds
/// to one subsystem; every field has a default so a partial (or missing)
/// file is always usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MurmurConfig {
    pub general: GeneralConfig,
    pub hotkey: HotkeyConfig,
    pub audio: AudioConfig,
    pub transcription: TranscriptionConfig,
}

impl MurmurConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MurmurConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MurmurError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Default config file path: `~/.murmur/config.toml`.
pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".murmur").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".murmur").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Which physical Option/Alt key(s) activate dictation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HotkeyBinding {
    /// Either the left or the right key.
    Either,
    /// Only the left key.
    LeftOnly,
    /// Only the right key.
    RightOnly,
}

impl Default for HotkeyBinding {
    fn default() -> Self {
        HotkeyBinding::Either
    }
}

impl std::fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HotkeyBinding::Either => write!(f, "either"),
            HotkeyBinding::LeftOnly => write!(f, "left-only"),
            HotkeyBinding::RightOnly => write!(f, "right-only"),
        }
    }
}

/// Hotkey detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Which key(s) qualify as the dictation hotkey.
    pub binding: HotkeyBinding,
    /// Minimum hold duration before a press is treated as intentional.
    /// Filters out taps from typing special characters.
    pub debounce_ms: u64,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            binding: HotkeyBinding::Either,
            debounce_ms: 200,
        }
    }
}

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz. 24 kHz matches the transcription backend's
    /// preferred input.
    pub sample_rate: u32,
    /// Number of channels (the capture pipeline assumes mono).
    pub channels: u16,
    /// Gain multiplier applied to the RMS loudness reading before clamping.
    /// Tuned empirically for the terminal meter; not a normative value.
    pub meter_gain: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
            meter_gain: 8.0,
        }
    }
}

/// Transcription backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// ISO 639-1 language code, or empty for auto-detect.
    pub language: String,
    /// API key. Prefer the `MURMUR_API_KEY` env var; this field is a
    /// fallback for machines without a secret store.
    pub api_key: String,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Overall request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini-transcribe".to_string(),
            language: String::new(),
            api_key: String::new(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MurmurConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.hotkey.binding, HotkeyBinding::Either);
        assert_eq!(config.hotkey.debounce_ms, 200);
        assert_eq!(config.audio.sample_rate, 24_000);
        assert_eq!(config.audio.channels, 1);
        assert_eq!(config.transcription.model, "gpt-4o-mini-transcribe");
        assert!(config.transcription.language.is_empty());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = MurmurConfig::default();
        config.hotkey.binding = HotkeyBinding::RightOnly;
        config.hotkey.debounce_ms = 350;
        config.transcription.language = "de".to_string();

        config.save(&path).unwrap();
        let loaded = MurmurConfig::load(&path).unwrap();

        assert_eq!(loaded.hotkey.binding, HotkeyBinding::RightOnly);
        assert_eq!(loaded.hotkey.debounce_ms, 350);
        assert_eq!(loaded.transcription.language, "de");
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");
        let config = MurmurConfig::load_or_default(&path);
        assert_eq!(config.hotkey.debounce_ms, 200);
    }

    #[test]
    fn test_load_partial_file_merges_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[hotkey]\nbinding = \"left-only\"\n").unwrap();

        let config = MurmurConfig::load(&path).unwrap();
        assert_eq!(config.hotkey.binding, HotkeyBinding::LeftOnly);
        // Untouched sections keep their defaults.
        assert_eq!(config.hotkey.debounce_ms, 200);
        assert_eq!(config.audio.sample_rate, 24_000);
    }

    #[test]
    fn test_load_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid toml [[[").unwrap();

        let config = MurmurConfig::load_or_default(&path);
        assert_eq!(config.transcription.model, "gpt-4o-mini-transcribe");
    }

    #[test]
    fn test_binding_serde_names() {
        let toml = "[hotkey]\nbinding = \"right-only\"\n";
        let config: MurmurConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.hotkey.binding, HotkeyBinding::RightOnly);

        let out = toml::to_string(&config).unwrap();
        assert!(out.contains("right-only"));
    }
}
