//! Configuration file parser for ~/.config/nyam/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde, though we log a warning when
//! the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
///
/// The custom `Debug` impl masks `gemini_api_key` to keep the credential out
/// of logs and error messages.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini API key (alternative to the GEMINI_API_KEY env var).
    /// The env var takes precedence over the config file.
    pub gemini_api_key: Option<String>,

    /// Spin delay in milliseconds. Exists purely so the caller's animation
    /// has something to animate.
    pub spin_duration_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            spin_duration_ms: 2000,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("spin_duration_ms", &self.spin_duration_ms)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["gemini_api_key", "spin_duration_ms"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.spin_duration_ms, 2000);
    }

    #[test]
    fn missing_file_returns_default() {
        let path = Path::new("/tmp/nyam_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.spin_duration_ms, 2000);
    }

    #[test]
    fn empty_file_returns_default() {
        let dir = std::env::temp_dir().join("nyam_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.spin_duration_ms, 2000);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("nyam_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "spin_duration_ms = 500\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.spin_duration_ms, 500);
        assert_eq!(config.gemini_api_key, None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn full_config() {
        let dir = std::env::temp_dir().join("nyam_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            "gemini_api_key = \"test-key-123\"\nspin_duration_ms = 100\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.gemini_api_key.as_deref(), Some("test-key-123"));
        assert_eq!(config.spin_duration_ms, 100);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("nyam_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("nyam_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "totally_fake_key = \"should not fail\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.spin_duration_ms, 2000);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn too_large_file_rejected() {
        let dir = std::env::temp_dir().join("nyam_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::TooLarge(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn debug_masks_api_key() {
        let config = Config {
            gemini_api_key: Some("super-secret-key-12345".to_string()),
            ..Config::default()
        };

        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-key-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
