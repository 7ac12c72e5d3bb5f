//! Prometheus-backed counters for the development server.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counts proxied traffic per route prefix; never records paths or headers.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    proxy_requests_total: IntCounterVec,
    proxy_upstream_failures_total: IntCounterVec,
    static_requests_total: IntCounter,
    host_check_rejections_total: IntCounter,
}

/// Snapshot of the scalar counters for health reporting and tests.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Requests answered from the static asset directory.
    pub static_requests_total: u64,
    /// Requests refused because of an unexpected `Host` header.
    pub host_check_rejections_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let proxy_requests_total = IntCounterVec::new(
            Opts::new(
                "proxy_requests_total",
                "Requests forwarded to an upstream by route prefix and status",
            ),
            &["route", "code"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "proxy_requests_total",
            source,
        })?;
        let proxy_upstream_failures_total = IntCounterVec::new(
            Opts::new(
                "proxy_upstream_failures_total",
                "Forwarded requests that never reached the upstream",
            ),
            &["route"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "proxy_upstream_failures_total",
            source,
        })?;
        let static_requests_total = IntCounter::with_opts(Opts::new(
            "static_requests_total",
            "Requests served from the static asset directory",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "static_requests_total",
            source,
        })?;
        let host_check_rejections_total = IntCounter::with_opts(Opts::new(
            "host_check_rejections_total",
            "Requests rejected by the Host header check",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "host_check_rejections_total",
            source,
        })?;

        register(&registry, "proxy_requests_total", &proxy_requests_total)?;
        register(
            &registry,
            "proxy_upstream_failures_total",
            &proxy_upstream_failures_total,
        )?;
        register(&registry, "static_requests_total", &static_requests_total)?;
        register(
            &registry,
            "host_check_rejections_total",
            &host_check_rejections_total,
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                proxy_requests_total,
                proxy_upstream_failures_total,
                static_requests_total,
                host_check_rejections_total,
            }),
        })
    }

    /// Count one proxied request for the given route prefix and upstream status.
    pub fn inc_proxy_request(&self, route: &str, status: u16) {
        self.inner
            .proxy_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Count one forwarded request that failed before an upstream response.
    pub fn inc_upstream_failure(&self, route: &str) {
        self.inner
            .proxy_upstream_failures_total
            .with_label_values(&[route])
            .inc();
    }

    /// Count one static asset request.
    pub fn inc_static_request(&self) {
        self.inner.static_requests_total.inc();
    }

    /// Count one request rejected by the host check.
    pub fn inc_host_check_rejection(&self) {
        self.inner.host_check_rejections_total.inc();
    }

    /// Proxied request count for a route/status pair.
    #[must_use]
    pub fn proxy_requests(&self, route: &str, status: u16) -> u64 {
        self.inner
            .proxy_requests_total
            .with_label_values(&[route, &status.to_string()])
            .get()
    }

    /// Upstream failure count for a route.
    #[must_use]
    pub fn upstream_failures(&self, route: &str) -> u64 {
        self.inner
            .proxy_upstream_failures_total
            .with_label_values(&[route])
            .get()
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the scalar counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            static_requests_total: self.inner.static_requests_total.get(),
            host_check_rejections_total: self.inner.host_check_rejections_total.get(),
        }
    }
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_render() -> anyhow::Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_proxy_request("/api", 200);
        metrics.inc_proxy_request("/api", 200);
        metrics.inc_proxy_request("/auth", 401);
        metrics.inc_upstream_failure("/api");
        metrics.inc_static_request();
        metrics.inc_host_check_rejection();

        assert_eq!(metrics.proxy_requests("/api", 200), 2);
        assert_eq!(metrics.proxy_requests("/auth", 401), 1);
        assert_eq!(metrics.upstream_failures("/api"), 1);
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                static_requests_total: 1,
                host_check_rejections_total: 1,
            }
        );

        let rendered = metrics.render()?;
        assert!(rendered.contains("proxy_requests_total"));
        assert!(rendered.contains("route=\"/auth\""));
        Ok(())
    }

    #[test]
    fn registries_are_independent() -> anyhow::Result<()> {
        let first = Metrics::new()?;
        let second = Metrics::new()?;
        first.inc_static_request();
        assert_eq!(second.snapshot().static_requests_total, 0);
        Ok(())
    }
}
