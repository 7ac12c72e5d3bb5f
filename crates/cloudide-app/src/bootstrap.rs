use std::sync::Arc;

use clap::Parser;
use cloudide_client::{
    ClientServices, HttpClient, MemoryRouter, MemorySessionStore, NotificationCenter, PortalApi,
    TranslationBundle,
};
use cloudide_config::{ClientEndpoints, DevServerConfig, public_path, resolve_client_endpoints};
use cloudide_devserver::DevServer;
use cloudide_telemetry::{LoggingConfig, Metrics, RuntimeContext, build_sha};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::settings::{AppSettings, Cli};

/// Route the in-memory router starts on.
pub const HOME_ROUTE: &str = "/";

/// Mounted client runtime: the shared HTTP client plus the collaborators its
/// interceptors act on.
#[derive(Clone)]
pub struct Application {
    settings: AppSettings,
    session: MemorySessionStore,
    router: MemoryRouter,
    notifications: NotificationCenter,
    api: PortalApi,
}

impl Application {
    /// Resolve endpoints for the build mode and wire the standard interceptor chain.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn mount(settings: AppSettings) -> AppResult<Self> {
        let endpoints = resolve_client_endpoints(settings.mode);
        let session = MemorySessionStore::new();
        let router = MemoryRouter::new(HOME_ROUTE);
        let notifications = NotificationCenter::new();
        let services = ClientServices {
            session: Arc::new(session.clone()),
            navigator: Arc::new(router.clone()),
            notifier: Arc::new(notifications.clone()),
            messages: TranslationBundle::new(settings.locale),
        };

        let http = HttpClient::standard(endpoints, settings.origin.clone(), &services)
            .map_err(|err| AppError::client("http_client.build", err))?;
        let api = PortalApi::new(http, services.session);

        info!(
            mode = settings.mode.as_str(),
            origin = %settings.origin,
            api_base = %api.http().endpoints().api_base,
            workspace_url = %api.http().endpoints().workspace_url,
            locale = settings.locale.code(),
            public_path = public_path(settings.mode),
            "client runtime mounted"
        );

        Ok(Self {
            settings,
            session,
            router,
            notifications,
            api,
        })
    }

    /// Settings the runtime was mounted with.
    #[must_use]
    pub const fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Endpoints resolved for the build mode.
    #[must_use]
    pub const fn endpoints(&self) -> &ClientEndpoints {
        self.api.http().endpoints()
    }

    /// Session store the bearer-token stage reads from.
    #[must_use]
    pub const fn session(&self) -> &MemorySessionStore {
        &self.session
    }

    /// Router the status guard redirects.
    #[must_use]
    pub const fn router(&self) -> &MemoryRouter {
        &self.router
    }

    /// Notifications raised by the status guard.
    #[must_use]
    pub const fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Typed portal calls over the shared client.
    #[must_use]
    pub const fn api(&self) -> &PortalApi {
        &self.api
    }
}

/// Dev-server settings for `settings`: optional YAML document, then
/// environment overrides. Proxy routes are dropped outside development.
///
/// # Errors
///
/// Returns an error when the document cannot be read or parsed, or an
/// override is invalid.
pub fn load_devserver_config<F>(settings: &AppSettings, lookup: F) -> AppResult<DevServerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match settings.devserver_config.as_deref() {
        Some(path) => DevServerConfig::load(path)
            .map_err(|err| AppError::config("devserver.load", err))?,
        None => DevServerConfig::default(),
    };
    config
        .apply_env_overrides(lookup)
        .map_err(|err| AppError::config("devserver.env_overrides", err))?;
    config
        .validate()
        .map_err(|err| AppError::config("devserver.validate", err))?;
    if !settings.mode.is_development() {
        config.proxy.clear();
    }
    Ok(config)
}

/// Mounted runtime plus the dev server ready to serve.
pub struct Runtime {
    /// Client runtime.
    pub app: Application,
    /// Dev server serving the bundle (and proxying in development).
    pub server: DevServer,
}

/// Mount the client runtime and assemble the dev server for `settings`.
///
/// # Errors
///
/// Returns an error when any component fails to build.
pub fn assemble<F>(settings: AppSettings, lookup: F) -> AppResult<Runtime>
where
    F: Fn(&str) -> Option<String>,
{
    let devserver = load_devserver_config(&settings, lookup)?;
    let metrics = Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
    let server = DevServer::new(&devserver, public_path(settings.mode), metrics)
        .map_err(|err| AppError::dev_server("devserver.new", err))?;
    info!(
        addr = %server.addr(),
        proxy_routes = devserver.proxy.len(),
        static_dir = %devserver.static_dir.display(),
        "dev server assembled"
    );
    let app = Application::mount(settings)?;
    Ok(Runtime { app, server })
}

/// Entry point for the boot sequence.
///
/// # Errors
///
/// Returns an error if settings are invalid, logging cannot be installed,
/// or the dev server fails.
pub async fn run_app() -> AppResult<()> {
    let env = |key: &str| std::env::var(key).ok();
    let settings = Cli::parse().apply(AppSettings::from_env(env)?)?;

    let logging = LoggingConfig {
        level: &settings.log_level,
        format: settings.log_format,
        build_sha: build_sha(),
    };
    cloudide_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = RuntimeContext::enter(settings.mode.as_str(), public_path(settings.mode));

    info!("Cloud IDE client runtime bootstrap starting");
    let Runtime { app, server } = assemble(settings, env)?;
    info!(mode = app.settings().mode.as_str(), "bootstrap complete");

    server
        .serve()
        .await
        .map_err(|err| AppError::dev_server("devserver.serve", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudide_client::{LOGIN_ROUTE, Navigator, SESSION_TOKEN_KEY, SessionStore};
    use cloudide_config::BuildMode;
    use cloudide_test_support::fixtures::env_lookup;

    fn settings(mode: &str) -> anyhow::Result<AppSettings> {
        Ok(AppSettings::from_env(env_lookup(&[("CLOUDIDE_MODE", mode)]))?)
    }

    #[test]
    fn mount_resolves_endpoints_for_the_mode() -> anyhow::Result<()> {
        let app = Application::mount(settings("development")?)?;
        assert_eq!(app.endpoints().workspace_url.as_str(), "http://localhost:8080/ws/");
        assert_eq!(app.router().current(), HOME_ROUTE);
        assert!(app.session().is_empty());

        let app = Application::mount(settings("production")?)?;
        assert_eq!(app.endpoints().workspace_url.as_str(), "https://tiantianai.co/ws/");
        assert_eq!(app.settings().mode, BuildMode::Production);
        Ok(())
    }

    #[test]
    fn mounted_collaborators_are_shared_with_the_client() -> anyhow::Result<()> {
        let app = Application::mount(settings("development")?)?;
        app.session().set(SESSION_TOKEN_KEY, "T".into());
        app.api().logout();
        assert!(app.session().is_empty());
        assert_ne!(app.router().current(), LOGIN_ROUTE);
        Ok(())
    }

    #[test]
    fn proxy_routes_only_survive_in_development() -> anyhow::Result<()> {
        let development = load_devserver_config(&settings("development")?, env_lookup(&[]))?;
        assert_eq!(development.proxy.len(), 2);

        let production = load_devserver_config(&settings("production")?, env_lookup(&[]))?;
        assert!(production.proxy.is_empty());
        Ok(())
    }

    #[test]
    fn devserver_document_and_overrides_are_layered() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("devserver.yaml");
        std::fs::write(&path, "port: 9090\ndisable_host_check: false\n")?;

        let mut settings = settings("development")?;
        settings.devserver_config = Some(path);
        let config = load_devserver_config(
            &settings,
            env_lookup(&[("CLOUDIDE_PROXY_TARGET", "http://127.0.0.1:7000")]),
        )?;
        assert_eq!(config.port, 9090);
        assert!(!config.disable_host_check);
        assert!(
            config
                .proxy
                .iter()
                .all(|route| route.target.as_str() == "http://127.0.0.1:7000/")
        );
        Ok(())
    }

    #[test]
    fn missing_devserver_document_is_a_config_error() -> anyhow::Result<()> {
        let mut settings = settings("development")?;
        settings.devserver_config = Some("does/not/exist.yaml".into());
        let err = load_devserver_config(&settings, env_lookup(&[]))
            .expect_err("missing file must fail");
        assert!(matches!(
            err,
            AppError::Config {
                operation: "devserver.load",
                ..
            }
        ));
        Ok(())
    }
}
