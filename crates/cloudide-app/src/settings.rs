//! Process settings gathered from the environment and command line.

use std::path::PathBuf;

use clap::Parser;
use cloudide_client::LocaleCode;
use cloudide_client::i18n::DEFAULT_LOCALE;
use cloudide_config::BuildMode;
use cloudide_config::defaults::{DEV_PROXY_TARGET, DEV_SERVER_PORT};
use cloudide_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, log_format_from_str};
use url::Url;

use crate::error::{AppError, AppResult};

/// Build mode tag.
pub const ENV_MODE: &str = "CLOUDIDE_MODE";
/// Build mode tag honoured when [`ENV_MODE`] is unset.
pub const ENV_NODE_ENV: &str = "NODE_ENV";
/// Page origin relative API bases resolve against.
pub const ENV_ORIGIN: &str = "CLOUDIDE_ORIGIN";
/// Locale used for user-facing messages.
pub const ENV_LOCALE: &str = "CLOUDIDE_LOCALE";
/// Optional YAML file with dev-server settings.
pub const ENV_DEVSERVER_CONFIG: &str = "CLOUDIDE_DEVSERVER_CONFIG";
/// Log level directive.
pub const ENV_LOG_LEVEL: &str = "CLOUDIDE_LOG_LEVEL";
/// `json` or `pretty`.
pub const ENV_LOG_FORMAT: &str = "CLOUDIDE_LOG_FORMAT";

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    /// Build mode selecting endpoints and public path.
    pub mode: BuildMode,
    /// Origin the page is served from.
    pub origin: Url,
    /// Locale for notifications.
    pub locale: LocaleCode,
    /// Dev-server YAML document, if any.
    pub devserver_config: Option<PathBuf>,
    /// Log level directive.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl AppSettings {
    /// Read settings through `lookup`, applying defaults for missing keys.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidConfig`] when the origin is not an absolute
    /// `http`/`https` URL.
    pub fn from_env<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = lookup(ENV_MODE)
            .or_else(|| lookup(ENV_NODE_ENV))
            .map_or(BuildMode::Production, |tag| BuildMode::from_tag(tag.trim()));

        let origin = match lookup(ENV_ORIGIN) {
            Some(raw) => parse_origin(ENV_ORIGIN, &raw)?,
            None => default_origin(mode)?,
        };

        let locale = lookup(ENV_LOCALE)
            .and_then(|tag| LocaleCode::from_lang_tag(&tag))
            .unwrap_or(DEFAULT_LOCALE);

        Ok(Self {
            mode,
            origin,
            locale,
            devserver_config: lookup(ENV_DEVSERVER_CONFIG)
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            log_level: lookup(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: log_format_from_str(lookup(ENV_LOG_FORMAT).as_deref()),
        })
    }
}

/// Origin used when none is configured: the dev server in development, the
/// public site otherwise.
fn default_origin(mode: BuildMode) -> AppResult<Url> {
    let raw = if mode.is_development() {
        format!("http://localhost:{DEV_SERVER_PORT}/")
    } else {
        format!("{DEV_PROXY_TARGET}/")
    };
    parse_origin("origin", &raw)
}

fn parse_origin(field: &'static str, raw: &str) -> AppResult<Url> {
    let invalid = |reason| AppError::InvalidConfig {
        field,
        reason,
        value: Some(raw.to_string()),
    };
    let url = Url::parse(raw.trim()).map_err(|_| invalid("not an absolute url"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    Ok(url)
}

/// Command-line flags; each one overrides its environment counterpart.
#[derive(Debug, Default, Parser)]
#[command(name = "cloudide", about = "Cloud IDE portal client runtime and dev server")]
pub struct Cli {
    /// Build mode tag (`development` selects the development branch).
    #[arg(long)]
    pub mode: Option<String>,
    /// Page origin relative API bases resolve against.
    #[arg(long)]
    pub origin: Option<String>,
    /// Dev-server YAML document.
    #[arg(long = "devserver-config")]
    pub devserver_config: Option<PathBuf>,
    /// Log level directive.
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Layer the flags over `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidConfig`] for an unusable `--origin`.
    pub fn apply(self, mut settings: AppSettings) -> AppResult<AppSettings> {
        if let Some(tag) = self.mode {
            let mode = BuildMode::from_tag(tag.trim());
            if mode != settings.mode && self.origin.is_none() {
                settings.origin = default_origin(mode)?;
            }
            settings.mode = mode;
        }
        if let Some(raw) = self.origin {
            settings.origin = parse_origin("--origin", &raw)?;
        }
        if let Some(path) = self.devserver_config {
            settings.devserver_config = Some(path);
        }
        if let Some(level) = self.log_level {
            settings.log_level = level;
        }
        Ok(settings)
    }
}
