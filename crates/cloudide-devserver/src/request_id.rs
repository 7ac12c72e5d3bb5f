//! `x-request-id` handling for dev-server traffic.
//!
//! An id already sent by the browser is kept. Otherwise a UUID is assigned
//! before routing, so proxied requests carry it upstream and every response
//! echoes it back.

use axum::Router;
use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Header carrying the request id.
pub(crate) const REQUEST_ID_HEADER: &str = "x-request-id";

/// Wrap `router` with id assignment (outermost) and response propagation.
pub(crate) fn with_request_ids(router: Router) -> Router {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    router
        .layer(PropagateRequestIdLayer::new(header.clone()))
        .layer(SetRequestIdLayer::new(header, MakeRequestUuid))
}

/// Id assigned to `request`, or an empty string before assignment.
pub(crate) fn request_id_of<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use tower::ServiceExt;

    fn router() -> Router {
        with_request_ids(Router::new().route(
            "/",
            get(|request: Request<Body>| async move { request_id_of(&request).to_string() }),
        ))
    }

    #[tokio::test]
    async fn missing_ids_are_assigned_and_echoed() -> anyhow::Result<()> {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty())?)
            .await?;
        let echoed = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("response lacks a request id"))?;
        let seen = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(seen.as_ref(), echoed.as_bytes());
        assert_eq!(echoed.len(), 36);
        Ok(())
    }

    #[tokio::test]
    async fn incoming_ids_are_kept() -> anyhow::Result<()> {
        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "browser-7")
            .body(Body::empty())?;
        let response = router().oneshot(request).await?;
        assert_eq!(
            response
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok()),
            Some("browser-7")
        );
        Ok(())
    }

    #[test]
    fn requests_without_an_id_read_as_empty() -> anyhow::Result<()> {
        let request = Request::builder().uri("/").body(())?;
        assert_eq!(request_id_of(&request), "");
        Ok(())
    }
}
