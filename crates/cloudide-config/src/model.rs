//! Build modes and the client endpoint pair derived from them.
//!
//! # Design
//! - The mode is an explicit parameter; nothing here reads the process environment.
//! - Unknown mode tags map to [`BuildMode::Other`] instead of failing.
//! - Endpoints split on `development`; the public path splits on `production`.

use std::convert::Infallible;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults::{
    DEVELOPMENT_API_BASE, DEVELOPMENT_MODE_TAG, DEVELOPMENT_PUBLIC_PATH,
    DEVELOPMENT_WORKSPACE_URL, OTHER_MODE_TAG, PRODUCTION_API_BASE, PRODUCTION_MODE_TAG,
    PRODUCTION_PUBLIC_PATH, PRODUCTION_WORKSPACE_URL,
};
use crate::error::{ConfigError, ConfigResult};

/// Build mode selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Local development build served through the dev server.
    Development,
    /// Production build, served under `/cloud-ide/` behind the reverse proxy.
    Production,
    /// Any other tag (`test`, empty, ...): production endpoints, root public path.
    Other,
}

impl BuildMode {
    /// Map a raw mode tag onto a build mode. Tags are matched exactly.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            DEVELOPMENT_MODE_TAG => Self::Development,
            PRODUCTION_MODE_TAG => Self::Production,
            _ => Self::Other,
        }
    }

    #[must_use]
    /// Render the mode as its lowercase string representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => DEVELOPMENT_MODE_TAG,
            Self::Production => PRODUCTION_MODE_TAG,
            Self::Other => OTHER_MODE_TAG,
        }
    }

    /// Whether this is the development build.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for BuildMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl Display for BuildMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API and workspace bases applied to the shared HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEndpoints {
    /// Prefix prepended to every API path. Empty means "same origin".
    pub api_base: String,
    /// Absolute base for workspace (IDE) URLs.
    pub workspace_url: Url,
}

impl ClientEndpoints {
    /// Build an endpoint pair from raw strings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] when the workspace URL does not parse.
    pub fn new(api_base: impl Into<String>, workspace_url: &str) -> ConfigResult<Self> {
        let workspace_url = Url::parse(workspace_url).map_err(|source| ConfigError::InvalidUrl {
            field: "workspace_url".to_string(),
            value: workspace_url.to_string(),
            source,
        })?;
        Ok(Self {
            api_base: api_base.into(),
            workspace_url,
        })
    }
}

/// Resolve the endpoint pair for a build mode.
///
/// The baked-in URLs are constants, so resolution cannot fail at runtime.
#[must_use]
pub fn resolve_client_endpoints(mode: BuildMode) -> ClientEndpoints {
    let (api_base, workspace) = match mode {
        BuildMode::Development => (DEVELOPMENT_API_BASE, DEVELOPMENT_WORKSPACE_URL),
        BuildMode::Production | BuildMode::Other => {
            (PRODUCTION_API_BASE, PRODUCTION_WORKSPACE_URL)
        }
    };
    let workspace_url = Url::parse(workspace).expect("baked-in workspace URL is valid");
    ClientEndpoints {
        api_base: api_base.to_string(),
        workspace_url,
    }
}

/// Public path static assets are served under for a build mode.
#[must_use]
pub const fn public_path(mode: BuildMode) -> &'static str {
    match mode {
        BuildMode::Production => PRODUCTION_PUBLIC_PATH,
        BuildMode::Development | BuildMode::Other => DEVELOPMENT_PUBLIC_PATH,
    }
}
