//! Configuration file loading.
//!
//! Reads a TOML file, parses it into a [`FitConfig`], and validates it before
//! returning. I/O errors, parse errors, and invalid settings are distinguished
//! in [`ConfigError`], and every message carries the source name.

use std::path::Path;

use super::FitConfig;
use crate::error::{AppError, FitError};

/// Errors arising from configuration I/O, parsing, or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{file}: {source}")]
    Invalid {
        file: String,
        #[source]
        source: FitError,
    },
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(2, err.to_string())
    }
}

/// Load and validate a [`FitConfig`] from a TOML file.
pub fn load_from_file(path: &Path) -> Result<FitConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        file: path.display().to_string(),
        source: e,
    })?;

    load_from_str(&content, &path.display().to_string())
}

/// Load and validate a [`FitConfig`] from a TOML string.
///
/// `source_name` identifies the input in error messages.
pub fn load_from_str(content: &str, source_name: &str) -> Result<FitConfig, ConfigError> {
    let config: FitConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        file: source_name.to_string(),
        source: e,
    })?;

    config.validate().map_err(|e| ConfigError::Invalid {
        file: source_name.to_string(),
        source: e,
    })?;

    tracing::debug!(source = source_name, "loaded fit configuration");
    Ok(config)
}
