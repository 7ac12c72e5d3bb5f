//! Router assembly and the serve loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use cloudide_config::DevServerConfig;
use cloudide_telemetry::{Metrics, MetricsSnapshot, build_sha};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::assets::mount_assets;
use crate::error::{DevServerError, DevServerResult};
use crate::host::{HostCheckState, HostPolicy, host_check};
use crate::proxy::{ProxyTable, forward_matching};
use crate::request_id::{request_id_of, with_request_ids};

/// Liveness endpoint returning the scalar counters.
pub const HEALTH_PATH: &str = "/__devserver/health";
/// Prometheus text exposition of the dev-server counters.
pub const METRICS_PATH: &str = "/__devserver/metrics";

/// Development server: proxies API prefixes upstream and serves the bundle.
pub struct DevServer {
    addr: SocketAddr,
    router: Router,
}

impl DevServer {
    /// Assemble the router for `config`, mounting assets at `public_path`.
    ///
    /// # Errors
    ///
    /// Returns an error when an upstream client cannot be built or the
    /// public path is not absolute.
    pub fn new(
        config: &DevServerConfig,
        public_path: &str,
        metrics: Metrics,
    ) -> DevServerResult<Self> {
        let router = Router::new()
            .route(HEALTH_PATH, get(health))
            .route(METRICS_PATH, get(render_metrics))
            .with_state(metrics.clone());
        let mut router = mount_assets(router, &config.static_dir, public_path, metrics.clone())?;
        if !config.proxy.is_empty() {
            let table = Arc::new(ProxyTable::new(&config.proxy, &metrics)?);
            router = router.layer(middleware::from_fn_with_state(table, forward_matching));
        }

        let host_state = Arc::new(HostCheckState {
            policy: HostPolicy::new(config.public_host.as_deref(), config.disable_host_check),
            metrics,
        });
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "devserver.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id_of(request),
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(|response: &Response, latency: Duration, span: &Span| {
                span.record("status_code", response.status().as_u16());
                let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                span.record("latency_ms", latency_ms);
            });

        let router = with_request_ids(
            router
                .layer(middleware::from_fn_with_state(host_state, host_check))
                .layer(trace_layer),
        );

        Ok(Self {
            addr: SocketAddr::new(config.host, config.port),
            router,
        })
    }

    /// Address [`DevServer::serve`] binds.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Assembled router, for in-process requests.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error when the address cannot be bound or serving fails.
    pub async fn serve(self) -> DevServerResult<()> {
        let addr = self.addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| DevServerError::Bind { addr, source })?;
        tracing::info!("Starting dev server on http://{}", addr);
        self.run(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error when the accept loop fails.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> DevServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| DevServerError::Serve { source })?;
        tracing::info!("dev server stopped");
        Ok(())
    }
}

async fn health(State(metrics): State<Metrics>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}

async fn render_metrics(State(metrics): State<Metrics>) -> Response {
    match metrics.render() {
        Ok(body) => body.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
