//! Development server settings: listener, host check, static assets and
//! reverse-proxy routes.
//!
//! # Design
//! - Defaults reproduce the stock dev-server setup so an empty document is valid.
//! - YAML documents and environment overrides layer on top of the defaults.
//! - Environment access goes through an injected lookup so tests stay hermetic.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::defaults::{
    DEV_PROXY_PREFIXES, DEV_PROXY_TARGET, DEV_SERVER_PORT, DEV_SERVER_PUBLIC_HOST, DEV_STATIC_DIR,
};
use crate::error::{ConfigError, ConfigResult};
use crate::validate::{
    parse_port, parse_url, validate_port, validate_proxy_prefix, validate_proxy_target,
};

/// Environment variable overriding the listen address.
pub const ENV_DEV_HOST: &str = "CLOUDIDE_DEV_HOST";
/// Environment variable overriding the listen port.
pub const ENV_DEV_PORT: &str = "CLOUDIDE_DEV_PORT";
/// Environment variable overriding the upstream of every proxy route.
pub const ENV_PROXY_TARGET: &str = "CLOUDIDE_PROXY_TARGET";
/// Environment variable overriding the static asset directory.
pub const ENV_STATIC_DIR: &str = "CLOUDIDE_STATIC_DIR";

/// One path prefix forwarded to a remote origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRoute {
    /// Path prefix matched against incoming requests (for example `/api`).
    pub prefix: String,
    /// Upstream origin receiving the forwarded request.
    pub target: Url,
    /// Rewrite `Host` and `Origin` to match the target.
    #[serde(default)]
    pub change_origin: bool,
    /// Validate the upstream TLS certificate.
    #[serde(default = "secure_default")]
    pub secure: bool,
}

const fn secure_default() -> bool {
    true
}

impl ProxyRoute {
    /// Whether a request path falls under this route. The prefix is matched
    /// literally, so `/api` also claims `/apiary`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(self.prefix.as_str())
    }

    /// `scheme://host[:port]` of the target, as sent in a rewritten `Origin`.
    #[must_use]
    pub fn target_origin(&self) -> String {
        self.target.origin().ascii_serialization()
    }
}

/// Dev server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// Listen address.
    pub host: IpAddr,
    /// Listen port.
    pub port: u16,
    /// Public host name browsers use to reach the dev server.
    pub public_host: Option<String>,
    /// Skip `Host` header validation entirely.
    pub disable_host_check: bool,
    /// Directory holding the built static assets.
    pub static_dir: PathBuf,
    /// Reverse-proxy routes, evaluated in order.
    pub proxy: Vec<ProxyRoute>,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        let target = Url::parse(DEV_PROXY_TARGET).expect("baked-in proxy target is valid");
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEV_SERVER_PORT,
            public_host: Some(DEV_SERVER_PUBLIC_HOST.to_string()),
            disable_host_check: true,
            static_dir: PathBuf::from(DEV_STATIC_DIR),
            proxy: DEV_PROXY_PREFIXES
                .iter()
                .map(|prefix| ProxyRoute {
                    prefix: (*prefix).to_string(),
                    target: target.clone(),
                    change_origin: true,
                    secure: false,
                })
                .collect(),
        }
    }
}

impl DevServerConfig {
    /// Parse a YAML document layered over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML and
    /// [`ConfigError::InvalidField`] when validation fails.
    pub fn from_yaml_str(document: &str) -> ConfigResult<Self> {
        Self::parse(document, None)
    }

    /// Read and parse a YAML document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`DevServerConfig::from_yaml_str`].
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let document = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            operation: "devserver.read",
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded dev server configuration");
        Self::parse(&document, Some(path))
    }

    fn parse(document: &str, path: Option<&Path>) -> ConfigResult<Self> {
        let config = if document.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str::<Self>(document).map_err(|source| ConfigError::Parse {
                path: path.map(Path::to_path_buf),
                source,
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `CLOUDIDE_*` overrides resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error when an override value is malformed.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DEV_HOST) {
            self.host = raw.trim().parse().map_err(|_| {
                ConfigError::invalid_field(ENV_DEV_HOST, Some(raw.clone()), "not_an_ip")
            })?;
            debug!(host = %self.host, "dev server host overridden");
        }
        if let Some(raw) = lookup(ENV_DEV_PORT) {
            self.port = parse_port(ENV_DEV_PORT, &raw)?;
            debug!(port = self.port, "dev server port overridden");
        }
        if let Some(raw) = lookup(ENV_PROXY_TARGET) {
            let target = parse_url(ENV_PROXY_TARGET, &raw)?;
            validate_proxy_target(ENV_PROXY_TARGET, &target)?;
            for route in &mut self.proxy {
                route.target = target.clone();
            }
            debug!(target = %target, "proxy target overridden");
        }
        if let Some(raw) = lookup(ENV_STATIC_DIR) {
            self.static_dir = PathBuf::from(raw);
        }
        Ok(())
    }

    /// Validate listener and proxy settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_port("port", self.port)?;
        for (idx, route) in self.proxy.iter().enumerate() {
            validate_proxy_prefix(&format!("proxy[{idx}].prefix"), &route.prefix)?;
            validate_proxy_target(&format!("proxy[{idx}].target"), &route.target)?;
        }
        Ok(())
    }

    /// First proxy route matching `path`.
    #[must_use]
    pub fn route_for(&self, path: &str) -> Option<&ProxyRoute> {
        self.proxy.iter().find(|route| route.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_forward_api_and_auth_without_tls_checks() {
        let config = DevServerConfig::default();
        assert_eq!(config.port, 8080);
        assert!(config.disable_host_check);
        let prefixes: Vec<&str> = config.proxy.iter().map(|r| r.prefix.as_str()).collect();
        assert_eq!(prefixes, ["/api", "/auth"]);
        for route in &config.proxy {
            assert_eq!(route.target_origin(), "https://tiantianai.co");
            assert!(route.change_origin);
            assert!(!route.secure);
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn route_matching_uses_the_literal_prefix() {
        let config = DevServerConfig::default();
        let prefix_of = |path: &str| config.route_for(path).map(|route| route.prefix.as_str());
        assert_eq!(prefix_of("/api"), Some("/api"));
        assert_eq!(prefix_of("/api/workspace/list"), Some("/api"));
        assert_eq!(prefix_of("/apiary"), Some("/api"));
        assert_eq!(prefix_of("/authority/x"), Some("/auth"));
        assert_eq!(prefix_of("/ap"), None);
        assert_eq!(prefix_of("/v1/api"), None);
        assert_eq!(prefix_of("/index.html"), None);
    }

    #[test]
    fn yaml_layers_over_defaults() -> anyhow::Result<()> {
        let config = DevServerConfig::from_yaml_str(
            "port: 9090\nproxy:\n  - prefix: /api\n    target: http://127.0.0.1:8088\n",
        )?;
        assert_eq!(config.port, 9090);
        assert_eq!(config.public_host.as_deref(), Some("tiantianai.co"));
        assert_eq!(config.proxy.len(), 1);
        assert!(!config.proxy[0].change_origin);
        assert!(config.proxy[0].secure);
        Ok(())
    }

    #[test]
    fn empty_yaml_yields_defaults() -> anyhow::Result<()> {
        assert_eq!(DevServerConfig::from_yaml_str("  \n")?, DevServerConfig::default());
        Ok(())
    }

    #[test]
    fn yaml_rejects_invalid_prefix() {
        let err = DevServerConfig::from_yaml_str(
            "proxy:\n  - prefix: api\n    target: http://127.0.0.1:8088\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { .. }));
    }

    #[test]
    fn env_overrides_apply_through_lookup() -> anyhow::Result<()> {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DEV_HOST, "127.0.0.1"),
            (ENV_DEV_PORT, "3000"),
            (ENV_PROXY_TARGET, "http://localhost:8088"),
            (ENV_STATIC_DIR, "public"),
        ]);
        let mut config = DevServerConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(ToString::to_string))?;
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.port, 3000);
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert!(
            config
                .proxy
                .iter()
                .all(|route| route.target_origin() == "http://localhost:8088")
        );
        Ok(())
    }

    #[test]
    fn env_override_rejects_bad_port() {
        let mut config = DevServerConfig::default();
        let err = config
            .apply_env_overrides(|key| (key == ENV_DEV_PORT).then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { .. }));
    }
}
