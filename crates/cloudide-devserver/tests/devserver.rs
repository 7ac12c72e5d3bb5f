use std::path::Path;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::{StatusCode, header};
use cloudide_config::{DevServerConfig, ProxyRoute};
use cloudide_devserver::{DevServer, HEALTH_PATH, METRICS_PATH};
use cloudide_telemetry::Metrics;
use cloudide_test_support::fixtures::{spawn_router, static_site, unused_addr};
use tower::ServiceExt;
use url::Url;

const SITE: &[(&str, &str)] = &[
    ("index.html", "<div id=\"app\"></div>"),
    ("js/app.js", "console.log('portal')"),
];

fn config(
    static_dir: &Path,
    upstream: &str,
    change_origin: bool,
) -> anyhow::Result<DevServerConfig> {
    let target = Url::parse(upstream)?;
    Ok(DevServerConfig {
        public_host: Some("ide.tiantianai.co".into()),
        disable_host_check: false,
        static_dir: static_dir.to_path_buf(),
        proxy: ["/api", "/auth"]
            .iter()
            .map(|prefix| ProxyRoute {
                prefix: (*prefix).to_string(),
                target: target.clone(),
                change_origin,
                secure: false,
            })
            .collect(),
        ..DevServerConfig::default()
    })
}

async fn echo(request: Request) -> String {
    let value_of = |name: header::HeaderName| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };
    format!(
        "{} {} host={} origin={} auth={}",
        request.method(),
        request.uri(),
        value_of(header::HOST),
        value_of(header::ORIGIN),
        value_of(header::AUTHORIZATION),
    )
}

async fn body_text(response: axum::response::Response) -> anyhow::Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn get(uri: &str) -> anyhow::Result<Request> {
    Ok(Request::builder()
        .uri(uri)
        .header(header::HOST, "localhost:8080")
        .body(Body::empty())?)
}

#[tokio::test]
async fn api_requests_are_forwarded_with_a_rewritten_origin() -> anyhow::Result<()> {
    let upstream = spawn_router(Router::new().fallback(echo)).await?;
    let site = static_site(SITE)?;
    let metrics = Metrics::new()?;
    let server = DevServer::new(
        &config(site.path(), &upstream.base_url(), true)?,
        "/",
        metrics.clone(),
    )?;

    let request = Request::builder()
        .method("PUT")
        .uri("/api/workspace/start?force=1")
        .header(header::HOST, "localhost:8080")
        .header(header::ORIGIN, "http://localhost:8080")
        .header(header::AUTHORIZATION, "Bearer T")
        .body(Body::from("{\"id\":3}"))?;
    let response = server.router().oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await?;
    assert_eq!(
        text,
        format!(
            "PUT /api/workspace/start?force=1 host={} origin={} auth=Bearer T",
            upstream.addr,
            upstream.base_url()
        )
    );
    assert_eq!(metrics.proxy_requests("/api", 200), 1);
    Ok(())
}

#[tokio::test]
async fn origin_is_kept_when_rewriting_is_off() -> anyhow::Result<()> {
    let upstream = spawn_router(Router::new().fallback(echo)).await?;
    let site = static_site(SITE)?;
    let server = DevServer::new(
        &config(site.path(), &upstream.base_url(), false)?,
        "/",
        Metrics::new()?,
    )?;

    let response = server.router().oneshot(get("/auth/login")?).await?;
    let text = body_text(response).await?;
    assert_eq!(text, "GET /auth/login host=localhost:8080 origin=- auth=-");
    Ok(())
}

#[tokio::test]
async fn prefixes_match_literally() -> anyhow::Result<()> {
    let upstream = spawn_router(Router::new().fallback(echo)).await?;
    let site = static_site(SITE)?;
    let metrics = Metrics::new()?;
    let server = DevServer::new(
        &config(site.path(), &upstream.base_url(), false)?,
        "/",
        metrics.clone(),
    )?;

    let apiary = server.router().oneshot(get("/apiary?q=1")?).await?;
    assert_eq!(
        body_text(apiary).await?,
        "GET /apiary?q=1 host=localhost:8080 origin=- auth=-"
    );
    let bare = server.router().oneshot(get("/api")?).await?;
    assert_eq!(body_text(bare).await?, "GET /api host=localhost:8080 origin=- auth=-");
    assert_eq!(metrics.proxy_requests("/api", 200), 2);

    let page = server.router().oneshot(get("/ap")?).await?;
    assert_eq!(body_text(page).await?, "<div id=\"app\"></div>");
    Ok(())
}

#[tokio::test]
async fn unreachable_upstream_yields_bad_gateway() -> anyhow::Result<()> {
    let site = static_site(SITE)?;
    let dead = format!("http://{}", unused_addr()?);
    let metrics = Metrics::new()?;
    let server = DevServer::new(&config(site.path(), &dead, true)?, "/", metrics.clone())?;

    let response = server.router().oneshot(get("/api/workspace/list")?).await?;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(metrics.upstream_failures("/api"), 1);
    Ok(())
}

#[tokio::test]
async fn bundle_is_served_under_the_production_public_path() -> anyhow::Result<()> {
    let site = static_site(SITE)?;
    let metrics = Metrics::new()?;
    let mut settings = config(site.path(), "http://127.0.0.1:9", true)?;
    settings.proxy.clear();
    let server = DevServer::new(&settings, "/cloud-ide/", metrics.clone())?;

    let script = server.router().oneshot(get("/cloud-ide/js/app.js")?).await?;
    assert_eq!(script.status(), StatusCode::OK);
    assert_eq!(body_text(script).await?, "console.log('portal')");

    let deep_link = server.router().oneshot(get("/cloud-ide/workspaces/3")?).await?;
    assert_eq!(deep_link.status(), StatusCode::OK);
    assert_eq!(body_text(deep_link).await?, "<div id=\"app\"></div>");

    let outside = server.router().oneshot(get("/api/workspace/list")?).await?;
    assert_eq!(outside.status(), StatusCode::NOT_FOUND);

    assert_eq!(metrics.snapshot().static_requests_total, 2);
    Ok(())
}

#[tokio::test]
async fn unknown_hosts_are_refused() -> anyhow::Result<()> {
    let site = static_site(SITE)?;
    let metrics = Metrics::new()?;
    let server = DevServer::new(
        &config(site.path(), "http://127.0.0.1:9", true)?,
        "/",
        metrics.clone(),
    )?;

    let request = Request::builder()
        .uri("/index.html")
        .header(header::HOST, "evil.example")
        .body(Body::empty())?;
    let refused = server.router().oneshot(request).await?;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(refused).await?, "Invalid Host header");

    let request = Request::builder()
        .uri("/index.html")
        .header(header::HOST, "ide.tiantianai.co")
        .body(Body::empty())?;
    let allowed = server.router().oneshot(request).await?;
    assert_eq!(allowed.status(), StatusCode::OK);

    assert_eq!(metrics.snapshot().host_check_rejections_total, 1);
    Ok(())
}

#[tokio::test]
async fn health_and_metrics_endpoints_report_counters() -> anyhow::Result<()> {
    let site = static_site(SITE)?;
    let metrics = Metrics::new()?;
    let server = DevServer::new(
        &config(site.path(), "http://127.0.0.1:9", true)?,
        "/",
        metrics.clone(),
    )?;

    let warmup = server.router().oneshot(get("/js/app.js")?).await?;
    assert_eq!(warmup.status(), StatusCode::OK);

    let health = server.router().oneshot(get(HEALTH_PATH)?).await?;
    assert_eq!(health.status(), StatusCode::OK);
    let body = body_text(health).await?;
    assert!(body.contains("\"static_requests_total\":1"), "{body}");

    let exposition = body_text(server.router().oneshot(get(METRICS_PATH)?).await?).await?;
    assert!(exposition.contains("static_requests_total 1"), "{exposition}");
    Ok(())
}

#[tokio::test]
async fn responses_carry_a_request_id() -> anyhow::Result<()> {
    let site = static_site(SITE)?;
    let server = DevServer::new(
        &config(site.path(), "http://127.0.0.1:9", true)?,
        "/",
        Metrics::new()?,
    )?;

    let response = server.router().oneshot(get("/")?).await?;
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}

async fn upstream_request_id(request: Request) -> String {
    request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

#[tokio::test]
async fn proxied_requests_share_their_request_id_with_the_upstream() -> anyhow::Result<()> {
    let upstream = spawn_router(Router::new().fallback(upstream_request_id)).await?;
    let site = static_site(SITE)?;
    let server = DevServer::new(
        &config(site.path(), &upstream.base_url(), true)?,
        "/",
        Metrics::new()?,
    )?;

    let response = server.router().oneshot(get("/api/workspace/list")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let assigned = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("proxied response lacks a request id"))?;
    assert!(!assigned.is_empty());
    assert_eq!(body_text(response).await?, assigned);

    let request = Request::builder()
        .uri("/auth/login")
        .header(header::HOST, "localhost:8080")
        .header("x-request-id", "browser-42")
        .body(Body::empty())?;
    let response = server.router().oneshot(request).await?;
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("browser-42")
    );
    assert_eq!(body_text(response).await?, "browser-42");
    Ok(())
}

#[tokio::test]
async fn run_serves_until_shutdown_resolves() -> anyhow::Result<()> {
    let site = static_site(SITE)?;
    let server = DevServer::new(
        &config(site.path(), "http://127.0.0.1:9", true)?,
        "/",
        Metrics::new()?,
    )?;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(server.run(listener, async {
        let _ = stopped.await;
    }));

    let body = reqwest::get(format!("http://{addr}/js/app.js"))
        .await?
        .text()
        .await?;
    assert_eq!(body, "console.log('portal')");

    let _ = stop.send(());
    task.await??;
    Ok(())
}
