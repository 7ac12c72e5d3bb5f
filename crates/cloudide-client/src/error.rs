//! Error types for the shared HTTP client.

use bytes::Bytes;
use reqwest::header::{HeaderMap, InvalidHeaderValue};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

/// Failure of a single portal call.
///
/// Response interceptors receive and return this value whole, so callers
/// always see the status, headers and body of a failed response.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("request failed with an error status")]
    Status {
        /// Method of the failed request.
        method: Method,
        /// Fully resolved request URL.
        url: Url,
        /// Status returned by the server.
        status: StatusCode,
        /// Response headers.
        headers: HeaderMap,
        /// Raw response body.
        body: Bytes,
    },
    /// No response was received (connect, TLS, timeout or body read failure).
    #[error("request could not be completed")]
    Transport {
        /// Method of the failed request.
        method: Method,
        /// Fully resolved request URL.
        url: Url,
        /// Source transport error.
        source: reqwest::Error,
    },
    /// The request path could not be resolved into a URL.
    #[error("invalid request url")]
    InvalidUrl {
        /// Raw path or base that failed to resolve.
        value: String,
        /// Source parse error.
        source: url::ParseError,
    },
    /// A header value supplied by the caller was not valid.
    #[error("invalid request header")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
        /// Source header error.
        source: InvalidHeaderValue,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode response body")]
    Decode {
        /// URL the body was fetched from.
        url: Url,
        /// Source JSON error.
        source: serde_json::Error,
    },
    /// A request body could not be serialised.
    #[error("failed to encode request body")]
    Encode {
        /// Path of the request being built.
        path: String,
        /// Source JSON error.
        source: serde_json::Error,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build http client")]
    Build {
        /// Source reqwest error.
        source: reqwest::Error,
    },
    /// The portal answered successfully but reported a business failure.
    #[error("request rejected by the portal")]
    Rejected {
        /// Portal status code from the response envelope.
        code: i64,
        /// Message carried by the envelope.
        message: String,
    },
}

impl ClientError {
    /// HTTP status of the failed response, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw body of the failed response, when one was received.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether the server rejected the session.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;
