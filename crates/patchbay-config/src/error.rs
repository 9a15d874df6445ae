//! Errors raised while reading, writing or checking engine and graph files.

use std::path::PathBuf;

use patchbay_core::DescriptionError;
use thiserror::Error;

/// Everything that can go wrong in this crate.
///
/// File errors carry the path they were raised for, so the CLI can print
/// them without extra context.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file could not be read.
    #[error("cannot read '{path}': {source}")]
    ReadFile {
        /// File being read.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written.
    #[error("cannot write '{path}': {source}")]
    WriteFile {
        /// File being written.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: std::io::Error,
    },

    /// A parent directory could not be created.
    #[error("cannot create directory '{path}': {source}")]
    CreateDir {
        /// Directory being created.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: std::io::Error,
    },

    /// Engine settings are not valid TOML for [`EngineConfig`](crate::EngineConfig).
    #[error("bad engine settings: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Engine settings could not be written as TOML.
    #[error("cannot encode engine settings: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A graph file is not a valid description.
    #[error("bad graph file '{path}': {source}")]
    Graph {
        /// Graph file.
        path: PathBuf,
        /// XML cause.
        #[source]
        source: DescriptionError,
    },

    /// A setting is outside its valid range.
    #[error("setting '{setting}' {reason}")]
    InvalidSetting {
        /// Setting name as written in the TOML file.
        setting: &'static str,
        /// What the value must satisfy.
        reason: String,
    },

    /// A graph description would not build.
    #[error("graph does not validate: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}

impl ConfigError {
    /// [`ConfigError::ReadFile`] for `path`.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::WriteFile`] for `path`.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::CreateDir`] for `path`.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::Graph`] for `path`.
    pub fn graph(path: impl Into<PathBuf>, source: DescriptionError) -> Self {
        Self::Graph {
            path: path.into(),
            source,
        }
    }
}
