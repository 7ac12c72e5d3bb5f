//! Validation helpers for dev-server and proxy settings.

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Proxy prefixes must be absolute, non-root and carry no trailing slash.
pub(crate) fn validate_proxy_prefix(field: &str, prefix: &str) -> ConfigResult<()> {
    if !prefix.starts_with('/') {
        return Err(ConfigError::invalid_field(
            field,
            Some(prefix.to_string()),
            "must_start_with_slash",
        ));
    }
    if prefix.len() == 1 || prefix.ends_with('/') {
        return Err(ConfigError::invalid_field(
            field,
            Some(prefix.to_string()),
            "must_not_end_with_slash",
        ));
    }
    Ok(())
}

pub(crate) fn validate_proxy_target(field: &str, target: &Url) -> ConfigResult<()> {
    match target.scheme() {
        "http" | "https" => {}
        _ => {
            return Err(ConfigError::invalid_field(
                field,
                Some(target.to_string()),
                "unsupported_scheme",
            ));
        }
    }
    if target.host_str().is_none() {
        return Err(ConfigError::invalid_field(
            field,
            Some(target.to_string()),
            "missing_host",
        ));
    }
    Ok(())
}

pub(crate) fn validate_port(field: &str, port: u16) -> ConfigResult<()> {
    if port == 0 {
        return Err(ConfigError::invalid_field(
            field,
            Some(port.to_string()),
            "zero",
        ));
    }
    Ok(())
}

pub(crate) fn parse_port(field: &str, raw: &str) -> ConfigResult<u16> {
    let port = raw.trim().parse::<u16>().map_err(|_| {
        ConfigError::invalid_field(field, Some(raw.to_string()), "not_a_port")
    })?;
    validate_port(field, port)?;
    Ok(port)
}

pub(crate) fn parse_url(field: &str, raw: &str) -> ConfigResult<Url> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        field: field.to_string(),
        value: raw.to_string(),
        source,
    })
}
