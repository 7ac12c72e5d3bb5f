//! # Design
//!
//! - Centralize bootstrap errors for the binary.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: cloudide_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: cloudide_telemetry::TelemetryError,
    },
    /// HTTP client construction failed.
    #[error("http client operation failed")]
    Client {
        /// Operation identifier.
        operation: &'static str,
        /// Source client error.
        source: cloudide_client::ClientError,
    },
    /// Dev server operations failed.
    #[error("dev server operation failed")]
    DevServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source dev server error.
        source: cloudide_devserver::DevServerError,
    },
    /// Settings values were invalid.
    #[error("invalid configuration")]
    InvalidConfig {
        /// Setting that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value.
        value: Option<String>,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: cloudide_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: cloudide_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn client(
        operation: &'static str,
        source: cloudide_client::ClientError,
    ) -> Self {
        Self::Client { operation, source }
    }

    pub(crate) const fn dev_server(
        operation: &'static str,
        source: cloudide_devserver::DevServerError,
    ) -> Self {
        Self::DevServer { operation, source }
    }
}
