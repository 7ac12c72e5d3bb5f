//! Bearer token injection for protected API paths.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::interceptor::RequestInterceptor;
use crate::request::RequestDescriptor;
use crate::session::{SessionStore, session_token};

/// Path prefix of the endpoints that require a session.
pub const PROTECTED_PREFIX: &str = "/api";

/// Attaches `Authorization: Bearer <token>` to protected requests.
///
/// The prefix test is a literal string comparison on the caller's path, so
/// `/apiary` matches `/api` while `/auth/login` and absolute URLs do not. The
/// token is read at send time, never cached.
#[derive(Clone)]
pub struct BearerTokenInterceptor {
    session: Arc<dyn SessionStore>,
    prefix: String,
}

impl fmt::Debug for BearerTokenInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenInterceptor")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl BearerTokenInterceptor {
    /// Interceptor guarding [`PROTECTED_PREFIX`].
    #[must_use]
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self::with_prefix(session, PROTECTED_PREFIX)
    }

    /// Interceptor guarding a custom prefix.
    #[must_use]
    pub fn with_prefix(session: Arc<dyn SessionStore>, prefix: impl Into<String>) -> Self {
        Self {
            session,
            prefix: prefix.into(),
        }
    }
}

impl RequestInterceptor for BearerTokenInterceptor {
    fn on_request(&self, mut request: RequestDescriptor) -> RequestDescriptor {
        if !request.path_starts_with(&self.prefix) {
            return request;
        }
        let Some(token) = session_token(self.session.as_ref()) else {
            return request;
        };
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!(path = %request.path, "session token is not a valid header value");
            }
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use reqwest::header::HeaderMap;

    fn intercept(store: MemorySessionStore, request: RequestDescriptor) -> RequestDescriptor {
        BearerTokenInterceptor::new(Arc::new(store)).on_request(request)
    }

    fn authorization(request: &RequestDescriptor) -> Option<&str> {
        request
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
    }

    #[test]
    fn protected_paths_carry_the_token() {
        let request = intercept(
            MemorySessionStore::with_token("T"),
            RequestDescriptor::get("/api/workspace/list"),
        );
        assert_eq!(authorization(&request), Some("Bearer T"));
    }

    #[test]
    fn other_paths_are_untouched() {
        for path in ["/auth/login", "/login", "http://example.com/api/x", "api/x"] {
            let original = RequestDescriptor::post(path);
            let request = intercept(MemorySessionStore::with_token("T"), original.clone());
            assert_eq!(request, original, "{path}");
        }
    }

    #[test]
    fn prefix_match_is_literal() {
        let request = intercept(
            MemorySessionStore::with_token("T"),
            RequestDescriptor::get("/apiary"),
        );
        assert_eq!(authorization(&request), Some("Bearer T"));
    }

    #[test]
    fn missing_or_empty_token_leaves_headers_alone() {
        for store in [MemorySessionStore::new(), MemorySessionStore::with_token("")] {
            let request = intercept(store, RequestDescriptor::get("/api/spec/list"));
            assert_eq!(request.headers, HeaderMap::new());
        }
    }

    #[test]
    fn tokens_that_cannot_form_a_header_are_dropped() {
        let original = RequestDescriptor::get("/api/workspace/list");
        let request = intercept(MemorySessionStore::with_token("abc\ndef"), original.clone());
        assert!(authorization(&request).is_none());
        assert_eq!(request, original);
    }

    #[test]
    fn token_is_read_at_send_time() {
        let store = MemorySessionStore::new();
        let interceptor = BearerTokenInterceptor::new(Arc::new(store.clone()));
        assert!(authorization(&interceptor.on_request(RequestDescriptor::get("/api/x"))).is_none());

        store.set(crate::session::SESSION_TOKEN_KEY, "late".into());
        let request = interceptor.on_request(RequestDescriptor::get("/api/x"));
        assert_eq!(authorization(&request), Some("Bearer late"));
    }

    #[test]
    fn existing_headers_are_preserved() -> anyhow::Result<()> {
        let request = RequestDescriptor::get("/api/x").with_header("x-request-id", "r1")?;
        let request = intercept(MemorySessionStore::with_token("T"), request);
        assert_eq!(request.headers.len(), 2);
        assert_eq!(
            request.headers.get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("r1")
        );
        Ok(())
    }

    #[test]
    fn custom_prefix_is_honoured() {
        let interceptor = BearerTokenInterceptor::with_prefix(
            Arc::new(MemorySessionStore::with_token("T")),
            "/private",
        );
        let request = interceptor.on_request(RequestDescriptor::get("/api/x"));
        assert!(authorization(&request).is_none());
        let request = interceptor.on_request(RequestDescriptor::get("/private/x"));
        assert_eq!(authorization(&request), Some("Bearer T"));
    }
}
