//! Static bundle serving under the public path.

use std::path::Path;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use cloudide_telemetry::Metrics;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::{DevServerError, DevServerResult};

/// Entry document served for unknown paths so client-side routes resolve.
pub const INDEX_DOCUMENT: &str = "index.html";

/// Normalised mount point for a public path; `None` means the site root.
pub(crate) fn mount_point(public_path: &str) -> DevServerResult<Option<String>> {
    if !public_path.starts_with('/') || public_path.contains("//") {
        return Err(DevServerError::InvalidPublicPath {
            path: public_path.to_string(),
        });
    }
    let trimmed = public_path.trim_end_matches('/');
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

async fn count_static(State(metrics): State<Metrics>, request: Request, next: Next) -> Response {
    metrics.inc_static_request();
    next.run(request).await
}

/// Router answering every path from `static_dir`, falling back to the index.
fn asset_router(static_dir: &Path, metrics: Metrics) -> Router {
    let index = ServeFile::new(static_dir.join(INDEX_DOCUMENT));
    let files = ServeDir::new(static_dir).fallback(index);
    Router::new()
        .fallback_service(files)
        .layer(middleware::from_fn_with_state(metrics, count_static))
}

/// Attach the asset router to `router` at `public_path`.
pub(crate) fn mount_assets(
    router: Router,
    static_dir: &Path,
    public_path: &str,
    metrics: Metrics,
) -> DevServerResult<Router> {
    let assets = asset_router(static_dir, metrics);
    let mounted = match mount_point(public_path)? {
        Some(prefix) => router.nest_service(&prefix, assets),
        None => router.fallback_service(assets),
    };
    tracing::info!(
        public_path,
        static_dir = %static_dir.display(),
        "static assets mounted"
    );
    Ok(mounted)
}
