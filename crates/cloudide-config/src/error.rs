//! Error types for configuration loading and validation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A URL-valued field could not be parsed.
    #[error("invalid configuration url")]
    InvalidUrl {
        /// Field holding the URL.
        field: String,
        /// Raw value provided by the caller.
        value: String,
        /// Source parse error.
        source: url::ParseError,
    },
    /// The YAML document could not be decoded.
    #[error("failed to parse configuration document")]
    Parse {
        /// File the document was read from, if any.
        path: Option<PathBuf>,
        /// Source YAML error.
        source: serde_yaml::Error,
    },
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid_field(
        field: impl Into<String>,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            field: field.into(),
            value,
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn error_messages_are_constant_and_sources_preserved() {
        let invalid = ConfigError::invalid_field("port", Some("0".into()), "zero");
        assert_eq!(invalid.to_string(), "invalid configuration field");
        assert!(invalid.source().is_none());

        let io_err = ConfigError::Io {
            operation: "devserver.read",
            path: PathBuf::from("devserver.yaml"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(io_err.to_string(), "filesystem operation failed");
        assert!(io_err.source().is_some());
    }
}
