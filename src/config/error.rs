//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading `dataregistry.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: `{field}` {reason}")]
    Validation { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("dataregistry.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("dataregistry.toml"));

        let invalid = ConfigError::invalid("[[datasets]] url", "must not be empty");
        assert_eq!(
            invalid.to_string(),
            "Config validation error: `[[datasets]] url` must not be empty"
        );
    }
}
