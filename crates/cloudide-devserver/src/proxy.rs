//! Reverse proxy for the `/api` and `/auth` routes during development.
//!
//! # Design
//! - One upstream client per route so TLS verification follows the route's
//!   `secure` flag.
//! - Prefixes match literally (`/api` claims `/apiary`) and the first
//!   configured route wins, so dispatch is a middleware rather than axum routes.
//! - Bodies are buffered; the portal API exchanges small JSON documents.
//! - Redirects are passed back to the browser untouched.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cloudide_config::ProxyRoute;
use cloudide_telemetry::Metrics;
use reqwest::Client;
use reqwest::redirect::Policy;
use url::Url;

use crate::error::{DevServerError, DevServerResult};

/// Largest request body forwarded upstream.
pub const MAX_FORWARD_BODY: usize = 16 * 1024 * 1024;

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Forwarding state for a single route.
#[derive(Clone)]
pub(crate) struct RouteProxy {
    route: ProxyRoute,
    client: Client,
    metrics: Metrics,
}

impl RouteProxy {
    pub(crate) fn new(route: ProxyRoute, metrics: Metrics) -> DevServerResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!route.secure)
            .redirect(Policy::none())
            .build()
            .map_err(|source| DevServerError::UpstreamClient {
                prefix: route.prefix.clone(),
                source,
            })?;
        Ok(Self {
            route,
            client,
            metrics,
        })
    }

    /// Upstream URL for an incoming request URI.
    pub(crate) fn upstream_url(&self, uri: &Uri) -> Url {
        let mut url = self.route.target.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}{}", uri.path()));
        url.set_query(uri.query());
        url
    }

    /// Headers forwarded upstream.
    pub(crate) fn upstream_headers(&self, incoming: &HeaderMap) -> HeaderMap {
        let mut headers = strip_hop_by_hop(incoming);
        if self.route.change_origin {
            headers.remove(header::HOST);
            if headers.contains_key(header::ORIGIN) {
                if let Ok(origin) = HeaderValue::from_str(&self.route.target_origin()) {
                    headers.insert(header::ORIGIN, origin);
                }
            }
        }
        headers
    }

    async fn forward(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let url = self.upstream_url(&parts.uri);
        let prefix = self.route.prefix.as_str();

        let body = match to_bytes(body, MAX_FORWARD_BODY).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(route = prefix, error = %err, "request body rejected");
                return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
            }
        };

        let upstream = self
            .client
            .request(parts.method.clone(), url.clone())
            .headers(self.upstream_headers(&parts.headers))
            .body(body)
            .send()
            .await;

        let upstream = match upstream {
            Ok(response) => response,
            Err(err) => {
                self.metrics.inc_upstream_failure(prefix);
                tracing::warn!(route = prefix, url = %url, error = %err, "upstream unreachable");
                return (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response();
            }
        };

        let status = upstream.status();
        let headers = strip_hop_by_hop(upstream.headers());
        let bytes = match upstream.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.metrics.inc_upstream_failure(prefix);
                tracing::warn!(route = prefix, url = %url, error = %err, "upstream body interrupted");
                return (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response();
            }
        };

        self.metrics.inc_proxy_request(prefix, status.as_u16());
        tracing::debug!(
            route = prefix,
            method = %parts.method,
            url = %url,
            status = status.as_u16(),
            "proxied"
        );

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut out = headers.clone();
    for name in &HOP_BY_HOP {
        out.remove(name);
    }
    out.remove("keep-alive");
    out
}

/// Configured routes in declaration order.
pub(crate) struct ProxyTable {
    routes: Vec<RouteProxy>,
}

impl ProxyTable {
    pub(crate) fn new(routes: &[ProxyRoute], metrics: &Metrics) -> DevServerResult<Self> {
        let routes = routes
            .iter()
            .map(|route| {
                let proxy = RouteProxy::new(route.clone(), metrics.clone())?;
                tracing::info!(
                    prefix = %route.prefix,
                    target = %route.target,
                    change_origin = route.change_origin,
                    secure = route.secure,
                    "proxy route mounted"
                );
                Ok(proxy)
            })
            .collect::<DevServerResult<Vec<_>>>()?;
        Ok(Self { routes })
    }

    /// First route whose prefix `path` starts with.
    pub(crate) fn find(&self, path: &str) -> Option<&RouteProxy> {
        self.routes.iter().find(|proxy| proxy.route.matches(path))
    }
}

/// Forward requests under a proxied prefix; everything else continues to
/// the static bundle.
pub(crate) async fn forward_matching(
    State(table): State<Arc<ProxyTable>>,
    request: Request,
    next: Next,
) -> Response {
    match table.find(request.uri().path()) {
        Some(proxy) => proxy.forward(request).await,
        None => next.run(request).await,
    }
}
