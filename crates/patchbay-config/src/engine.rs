//! Engine settings file.

use std::path::{Path, PathBuf};

use patchbay_core::GraphEnv;
use patchbay_registry::BuiltinRegistry;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Process-wide engine settings.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// block_size = 128
/// frame_rate = 60
/// search_paths = ["graphs", "/usr/share/patchbay"]
/// ```
///
/// Every field is optional; missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per audio block.
    pub block_size: usize,
    /// Visual frame rate in Hz; one frame is ticked with `dt = 1 / frame_rate`.
    pub frame_rate: u32,
    /// Directories searched for graph files named by other graphs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 256,
            frame_rate: 60,
            search_paths: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load settings from a TOML file.
    ///
    /// Relative search paths are resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let mut config = Self::from_toml(&content)?;
        if let Some(dir) = path.parent() {
            for search in &mut config.search_paths {
                if search.is_relative() {
                    *search = dir.join(&*search);
                }
            }
        }
        tracing::debug!(path = %path.display(), ?config, "loaded engine config");
        Ok(config)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the settings to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "sample_rate",
                reason: "must be positive".to_string(),
            });
        }
        if self.block_size == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "block_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.frame_rate == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "frame_rate",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Seconds per visual frame.
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }

    /// Seconds per audio block.
    pub fn block_dt(&self) -> f32 {
        self.block_size as f32 / self.sample_rate.max(1) as f32
    }

    /// Environment with the built-in node and resource types and these
    /// settings.
    pub fn env(&self) -> GraphEnv {
        self.search_paths.iter().fold(
            BuiltinRegistry::new()
                .into_env()
                .with_sample_rate(self.sample_rate as f32)
                .with_block_size(self.block_size),
            |env, path| env.with_search_path(path.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.block_size, 256);
        assert_eq!(config.frame_rate, 60);
        assert!(config.search_paths.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml("block_size = 64").unwrap();
        assert_eq!(config.block_size, 64);
        assert_eq!(config.sample_rate, 44100);
    }

    #[test]
    fn test_rejects_zero_settings() {
        assert!(matches!(
            EngineConfig::from_toml("block_size = 0"),
            Err(ConfigError::InvalidSetting { setting: "block_size", .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml("sample_rate = 0"),
            Err(ConfigError::InvalidSetting { setting: "sample_rate", .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_types() {
        assert!(matches!(
            EngineConfig::from_toml("sample_rate = \"fast\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_durations() {
        let config = EngineConfig {
            sample_rate: 44100,
            block_size: 441,
            frame_rate: 50,
            search_paths: Vec::new(),
        };
        assert!((config.frame_dt() - 0.02).abs() < 1e-7);
        assert!((config.block_dt() - 0.01).abs() < 1e-7);
    }

    #[test]
    fn test_env_carries_settings() {
        let config = EngineConfig {
            sample_rate: 48000,
            block_size: 128,
            frame_rate: 60,
            search_paths: vec![PathBuf::from("/graphs")],
        };
        let env = config.env();
        assert_eq!(env.sample_rate, 48000.0);
        assert_eq!(env.block_size, 128);
        assert_eq!(env.search_paths, vec![PathBuf::from("/graphs")]);
        assert!(env.node_types.descriptor("audio.output").is_some());
    }
}
