//! # Design
//!
//! - One crate-level error type for dev-server construction and serving.
//! - Messages are constant; operational context lives in structured fields.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::net::SocketAddr;

/// Result alias for dev-server operations.
pub type DevServerResult<T> = std::result::Result<T, DevServerError>;

/// Errors raised while building or serving the dev server.
#[derive(Debug)]
pub enum DevServerError {
    /// Building the upstream HTTP client for a proxy route failed.
    UpstreamClient {
        /// Route prefix the client was built for.
        prefix: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// The public path cannot be mounted.
    InvalidPublicPath {
        /// Offending path.
        path: String,
    },
    /// Binding the listener failed.
    Bind {
        /// Address attempted.
        addr: SocketAddr,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Serving failed.
    Serve {
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl Display for DevServerError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamClient { .. } => formatter.write_str("failed to build upstream client"),
            Self::InvalidPublicPath { .. } => formatter.write_str("invalid public path"),
            Self::Bind { .. } => formatter.write_str("failed to bind dev server listener"),
            Self::Serve { .. } => formatter.write_str("dev server terminated unexpectedly"),
        }
    }
}

impl Error for DevServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UpstreamClient { source, .. } => Some(source),
            Self::InvalidPublicPath { .. } => None,
            Self::Bind { source, .. } | Self::Serve { source } => Some(source),
        }
    }
}
