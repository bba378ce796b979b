// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup and passed
//! explicitly to the components that need it.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH0_DOMAIN` | Auth0 tenant host (e.g. `tenant.us.auth0.com`) | Required |
//! | `API_AUDIENCE` | Expected JWT audience claim | Required |
//! | `ALGORITHMS` | Comma-separated allowed signing algorithms | `RS256` |
//! | `AUTH0_ISSUER` | Expected JWT issuer claim | `https://{AUTH0_DOMAIN}/` |
//! | `JWKS_URL` | JWKS endpoint | `https://{AUTH0_DOMAIN}/.well-known/jwks.json` |
//! | `JWKS_TIMEOUT_SECS` | JWKS request timeout | `5` |
//! | `JWKS_CACHE_TTL_SECS` | JWKS cache lifetime, `0` disables caching | `0` |
//! | `JWKS_REFETCH_ON_UNKNOWN_KID` | Refetch a cached JWKS once on unknown `kid` | `true` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

pub const AUTH0_DOMAIN_ENV: &str = "AUTH0_DOMAIN";
pub const API_AUDIENCE_ENV: &str = "API_AUDIENCE";
pub const ALGORITHMS_ENV: &str = "ALGORITHMS";
pub const AUTH0_ISSUER_ENV: &str = "AUTH0_ISSUER";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const JWKS_TIMEOUT_ENV: &str = "JWKS_TIMEOUT_SECS";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_REFETCH_ENV: &str = "JWKS_REFETCH_ON_UNKNOWN_KID";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_JWKS_TIMEOUT: Duration = Duration::from_secs(5);
const JWKS_PATH: &str = ".well-known/jwks.json";

/// Invalid or missing configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}

/// Settings consumed by the auth pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    /// Identity provider host, without scheme or path
    pub issuer_domain: String,
    /// Expected `aud`
    pub audience: String,
    /// Expected `iss`
    pub issuer: String,
    pub jwks_url: String,
    /// Algorithms a token may be signed with (RSA family only)
    pub algorithms: Vec<Algorithm>,
    pub jwks_timeout: Duration,
    /// Zero disables caching
    pub jwks_cache_ttl: Duration,
    pub refetch_on_unknown_kid: bool,
}

impl AuthConfig {
    /// Configuration for `issuer_domain` with every optional setting at its default.
    pub fn new(issuer_domain: &str, audience: impl Into<String>) -> Result<Self, ConfigError> {
        let base = domain_url(issuer_domain)?;
        let jwks_url = base
            .join(JWKS_PATH)
            .map_err(|e| invalid(AUTH0_DOMAIN_ENV, e.to_string()))?;

        Ok(Self {
            issuer_domain: issuer_domain.to_string(),
            audience: audience.into(),
            issuer: base.to_string(),
            jwks_url: jwks_url.to_string(),
            algorithms: vec![Algorithm::RS256],
            jwks_timeout: DEFAULT_JWKS_TIMEOUT,
            jwks_cache_ttl: Duration::ZERO,
            refetch_on_unknown_kid: true,
        })
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let domain = required(AUTH0_DOMAIN_ENV)?;
        let audience = required(API_AUDIENCE_ENV)?;
        let mut config = Self::new(domain.trim(), audience.trim())?;

        if let Some(value) = lookup(ALGORITHMS_ENV) {
            config.algorithms = parse_algorithms(&value)?;
        }
        if let Some(issuer) = lookup(AUTH0_ISSUER_ENV) {
            config.issuer = issuer;
        }
        if let Some(url) = lookup(JWKS_URL_ENV) {
            Url::parse(&url).map_err(|e| invalid(JWKS_URL_ENV, e.to_string()))?;
            config.jwks_url = url;
        }
        if let Some(value) = lookup(JWKS_TIMEOUT_ENV) {
            config.jwks_timeout = parse_secs(JWKS_TIMEOUT_ENV, &value)?;
            if config.jwks_timeout.is_zero() {
                return Err(invalid(JWKS_TIMEOUT_ENV, "timeout must be positive"));
            }
        }
        if let Some(value) = lookup(JWKS_CACHE_TTL_ENV) {
            config.jwks_cache_ttl = parse_secs(JWKS_CACHE_TTL_ENV, &value)?;
        }
        if let Some(value) = lookup(JWKS_REFETCH_ENV) {
            config.refetch_on_unknown_kid = parse_bool(JWKS_REFETCH_ENV, &value)?;
        }

        Ok(config)
    }
}

/// `https://{domain}/`, rejecting anything that is not a bare host.
fn domain_url(domain: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(&format!("https://{domain}/"))
        .map_err(|e| invalid(AUTH0_DOMAIN_ENV, e.to_string()))?;

    let bare_host = url.host_str().is_some()
        && url.path() == "/"
        && url.query().is_none()
        && url.username().is_empty();
    if !bare_host {
        return Err(invalid(AUTH0_DOMAIN_ENV, format!("`{domain}` is not a bare host name")));
    }

    Ok(url)
}

fn parse_algorithms(value: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let algorithms = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            let alg: Algorithm = name
                .parse()
                .map_err(|_| invalid(ALGORITHMS_ENV, format!("unknown algorithm `{name}`")))?;
            if !is_rsa(alg) {
                return Err(invalid(
                    ALGORITHMS_ENV,
                    format!("`{name}` cannot be verified with RSA keys"),
                ));
            }
            Ok(alg)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if algorithms.is_empty() {
        return Err(invalid(ALGORITHMS_ENV, "at least one algorithm is required"));
    }
    Ok(algorithms)
}

fn is_rsa(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| invalid(name, e.to_string()))
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(name, format!("`{other}` is not a boolean"))),
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings for the HTTP listener and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_ENV) {
            config.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            config.port = port
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(PORT_ENV, e.to_string()))?;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.log_format = match format.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "" => LogFormat::Pretty,
                other => return Err(invalid(LOG_FORMAT_ENV, format!("unknown format `{other}`"))),
            };
        }

        Ok(config)
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
