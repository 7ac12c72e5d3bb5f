//! `Host` header allow-list.

use std::net::IpAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cloudide_telemetry::Metrics;

/// Hosts accepted by the dev server.
#[derive(Debug, Clone)]
pub(crate) struct HostPolicy {
    public_host: Option<String>,
    disabled: bool,
}

impl HostPolicy {
    pub(crate) fn new(public_host: Option<&str>, disabled: bool) -> Self {
        Self {
            public_host: public_host.map(|host| strip_port(host).to_ascii_lowercase()),
            disabled,
        }
    }

    pub(crate) fn allows(&self, host: Option<&str>) -> bool {
        if self.disabled {
            return true;
        }
        let Some(host) = host else {
            return false;
        };
        let name = strip_port(host).to_ascii_lowercase();
        if name == "localhost" || name.ends_with(".localhost") {
            return true;
        }
        if name.trim_matches(['[', ']']).parse::<IpAddr>().is_ok() {
            return true;
        }
        self.public_host.as_deref() == Some(name.as_str())
    }
}

/// Host part of a `host[:port]` value, keeping IPv6 brackets.
fn strip_port(value: &str) -> &str {
    let value = value.trim();
    if value.starts_with('[') {
        return value.find(']').map_or(value, |end| &value[..=end]);
    }
    match value.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            host
        }
        _ => value,
    }
}

#[derive(Clone)]
pub(crate) struct HostCheckState {
    pub(crate) policy: HostPolicy,
    pub(crate) metrics: Metrics,
}

pub(crate) async fn host_check(
    State(state): State<Arc<HostCheckState>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().authority().map(|authority| authority.as_str()));
    if state.policy.allows(host) {
        return next.run(request).await;
    }
    state.metrics.inc_host_check_rejection();
    tracing::warn!(host = host.unwrap_or(""), "request rejected by host check");
    (StatusCode::FORBIDDEN, "Invalid Host header").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_names_and_ip_literals_pass() {
        let policy = HostPolicy::new(None, false);
        assert!(policy.allows(Some("localhost:8080")));
        assert!(policy.allows(Some("app.localhost")));
        assert!(policy.allows(Some("127.0.0.1:8080")));
        assert!(policy.allows(Some("[::1]:8080")));
        assert!(policy.allows(Some("192.168.1.20")));
    }

    #[test]
    fn unknown_hosts_are_refused() {
        let policy = HostPolicy::new(None, false);
        assert!(!policy.allows(Some("evil.example")));
        assert!(!policy.allows(None));
    }

    #[test]
    fn public_host_is_allowed_regardless_of_port_or_case() {
        let policy = HostPolicy::new(Some("ide.tiantianai.co:443"), false);
        assert!(policy.allows(Some("IDE.tiantianai.co")));
        assert!(policy.allows(Some("ide.tiantianai.co:8080")));
        assert!(!policy.allows(Some("tiantianai.co")));
    }

    #[test]
    fn disabled_check_allows_everything() {
        let policy = HostPolicy::new(None, true);
        assert!(policy.allows(Some("anything.example")));
        assert!(policy.allows(None));
    }

    #[test]
    fn strip_port_handles_ipv6_and_bare_names() {
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("example.com:80"), "example.com");
    }
}
