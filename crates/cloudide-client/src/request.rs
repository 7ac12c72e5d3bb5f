//! Transport-neutral request and response descriptors.
//!
//! Interceptors operate on these values instead of reqwest builders so every
//! stage can be exercised without a network.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Outgoing request before URL resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Path as written by the caller (for example `/api/workspace/list`) or an
    /// absolute URL.
    pub path: String,
    /// Query parameters appended after resolution.
    pub query: Vec<(String, String)>,
    /// Headers sent with the request.
    pub headers: HeaderMap,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl RequestDescriptor {
    /// Descriptor for an arbitrary method and path.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// `GET` descriptor.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` descriptor.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` descriptor.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `DELETE` descriptor.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] when the body cannot be represented as JSON.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        let value = serde_json::to_value(body).map_err(|source| ClientError::Encode {
            path: self.path.clone(),
            source,
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Set a header from a string value. `name` must be lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidHeader`] when `value` contains characters
    /// not allowed in a header.
    pub fn with_header(mut self, name: &'static str, value: &str) -> ClientResult<Self> {
        let header = HeaderValue::from_str(value)
            .map_err(|source| ClientError::InvalidHeader { name, source })?;
        self.headers.insert(HeaderName::from_static(name), header);
        Ok(self)
    }

    /// Whether the path starts with the literal `prefix`.
    #[must_use]
    pub fn path_starts_with(&self, prefix: &str) -> bool {
        self.path.starts_with(prefix)
    }
}

/// Successful response as seen by interceptors and callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Fully resolved request URL.
    pub url: Url,
    /// Response status (always 2xx).
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body, untouched.
    pub body: Bytes,
}

impl ApiResponse {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_slice(&self.body).map_err(|source| ClientError::Decode {
            url: self.url.clone(),
            source,
        })
    }

    /// Body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
