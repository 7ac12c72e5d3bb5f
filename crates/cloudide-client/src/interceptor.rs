//! Interceptor traits and the ordered chain attached to the HTTP client.
//!
//! Request stages rewrite the outgoing descriptor; response stages observe
//! successes and failures. Stages run in registration order and never
//! short-circuit: a failure handler must hand back the error it received (or
//! an equivalent) so the caller sees the full failure.

use std::fmt;
use std::sync::Arc;

use crate::error::ClientError;
use crate::request::{ApiResponse, RequestDescriptor};

/// Pre-send hook.
pub trait RequestInterceptor: Send + Sync {
    /// Rewrite the outgoing request. Must not fail.
    fn on_request(&self, request: RequestDescriptor) -> RequestDescriptor;
}

/// Post-receive hook.
pub trait ResponseInterceptor: Send + Sync {
    /// Observe a successful response. Identity by default.
    fn on_response(&self, response: ApiResponse) -> ApiResponse {
        response
    }

    /// Observe a failed call and return the error to propagate.
    fn on_error(&self, error: ClientError) -> ClientError {
        error
    }
}

/// Ordered set of interceptors applied around every call.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("request_stages", &self.request.len())
            .field("response_stages", &self.response.len())
            .finish()
    }
}

impl InterceptorChain {
    /// Empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request stage.
    #[must_use]
    pub fn with_request(mut self, stage: Arc<dyn RequestInterceptor>) -> Self {
        self.request.push(stage);
        self
    }

    /// Append a response stage.
    #[must_use]
    pub fn with_response(mut self, stage: Arc<dyn ResponseInterceptor>) -> Self {
        self.response.push(stage);
        self
    }

    /// Number of request and response stages.
    #[must_use]
    pub fn len(&self) -> (usize, usize) {
        (self.request.len(), self.response.len())
    }

    /// Whether no stage is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty()
    }

    /// Run every request stage.
    #[must_use]
    pub fn apply_request(&self, request: RequestDescriptor) -> RequestDescriptor {
        self.request
            .iter()
            .fold(request, |request, stage| stage.on_request(request))
    }

    /// Run every response stage on a success.
    #[must_use]
    pub fn apply_response(&self, response: ApiResponse) -> ApiResponse {
        self.response
            .iter()
            .fold(response, |response, stage| stage.on_response(response))
    }

    /// Run every response stage on a failure.
    #[must_use]
    pub fn apply_error(&self, error: ClientError) -> ClientError {
        self.response
            .iter()
            .fold(error, |error, stage| stage.on_error(error))
    }
}

/// Debug-level tracing of every call. Header values are never logged.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingInterceptor;

impl RequestInterceptor for LoggingInterceptor {
    fn on_request(&self, request: RequestDescriptor) -> RequestDescriptor {
        tracing::debug!(
            target: "cloudide::http",
            method = %request.method,
            path = %request.path,
            authorized = request.headers.contains_key(reqwest::header::AUTHORIZATION),
            "sending request"
        );
        request
    }
}

impl ResponseInterceptor for LoggingInterceptor {
    fn on_response(&self, response: ApiResponse) -> ApiResponse {
        tracing::debug!(
            target: "cloudide::http",
            url = %response.url,
            status = response.status.as_u16(),
            bytes = response.body.len(),
            "response received"
        );
        response
    }

    fn on_error(&self, error: ClientError) -> ClientError {
        match &error {
            ClientError::Status {
                method,
                url,
                status,
                ..
            } => tracing::debug!(
                target: "cloudide::http",
                method = %method,
                url = %url,
                status = status.as_u16(),
                "request failed"
            ),
            other => tracing::debug!(target: "cloudide::http", error = %other, "request error"),
        }
        error
    }
}
