//! Baked-in endpoints and dev-server defaults.
//!
//! # Design
//! - Keep every literal origin in one place so build modes stay auditable.
//! - API bases are relative; the page origin (or reverse proxy) supplies the host.

/// API base applied in development builds (relative, proxied by the dev server).
pub const DEVELOPMENT_API_BASE: &str = "";
/// Workspace base applied in development builds.
pub const DEVELOPMENT_WORKSPACE_URL: &str = "http://localhost:8080/ws/";
/// API base applied in every non-development build (relative, proxied by nginx).
pub const PRODUCTION_API_BASE: &str = "";
/// Workspace base applied in every non-development build.
pub const PRODUCTION_WORKSPACE_URL: &str = "https://tiantianai.co/ws/";

/// Public asset path for production builds.
pub const PRODUCTION_PUBLIC_PATH: &str = "/cloud-ide/";
/// Public asset path for every build except production.
pub const DEVELOPMENT_PUBLIC_PATH: &str = "/";

/// Mode tag that selects the development branch.
pub const DEVELOPMENT_MODE_TAG: &str = "development";
/// Mode tag that selects the production public path.
pub const PRODUCTION_MODE_TAG: &str = "production";
/// Canonical tag rendered for any other mode (`test`, empty, ...).
pub const OTHER_MODE_TAG: &str = "other";

/// Dev server listen port.
pub const DEV_SERVER_PORT: u16 = 8080;
/// Host advertised to browsers by the dev server.
pub const DEV_SERVER_PUBLIC_HOST: &str = "tiantianai.co";
/// Upstream origin for proxied routes.
pub const DEV_PROXY_TARGET: &str = "https://tiantianai.co";
/// Path prefixes forwarded to the upstream during development.
pub const DEV_PROXY_PREFIXES: [&str; 2] = ["/api", "/auth"];
/// Directory holding built static assets.
pub const DEV_STATIC_DIR: &str = "dist";
