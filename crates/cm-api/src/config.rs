//! # Server Configuration
//!
//! Everything is read from environment variables and every variable is
//! optional. Malformed values fail startup rather than silently falling back.
//!
//! | Variable                 | Default    |
//! |--------------------------|------------|
//! | `PORT`                   | `3000`     |
//! | `APP_URL`                | unset      |
//! | `RATE_LIMIT_MAX`         | `100`      |
//! | `RATE_LIMIT_WINDOW_SECS` | `900`      |
//! | `RATE_LIMIT_MAX_CLIENTS` | `10000`    |
//! | `TRUST_PROXY`            | `false`    |
//! | `BODY_LIMIT_BYTES`       | `10485760` |
//! | `STATIC_DIR`             | unset      |
//! | `LOG_FORMAT`             | `text`     |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::middleware::rate_limit::RateLimitConfig;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default JSON body cap: 10 MiB.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// A configuration variable could not be interpreted.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Value did not parse as the expected type.
    #[error("invalid value for {name}: \"{value}\" ({reason})")]
    Invalid {
        /// Environment variable name.
        name: &'static str,
        /// Raw value found.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected \"text\" or \"json\", got \"{other}\"")),
        }
    }
}

/// Runtime configuration for the API server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind on all interfaces.
    pub port: u16,
    /// Single origin allowed to make credentialed CORS requests.
    /// `None` allows any origin without credentials.
    pub allowed_origin: Option<HeaderValue>,
    /// Fixed-window rate limit applied per client.
    pub rate_limit: RateLimitConfig,
    /// Maximum accepted request body size.
    pub body_limit_bytes: usize,
    /// Directory of built frontend assets to serve at `/`.
    pub static_dir: Option<PathBuf>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origin: None,
            rate_limit: RateLimitConfig::default(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            static_dir: None,
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Build configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first variable that is set but
    /// malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_var(&lookup, "PORT")?.unwrap_or(defaults.port);

        let allowed_origin = match non_empty(&lookup, "APP_URL") {
            Some(url) => Some(HeaderValue::from_str(url.trim_end_matches('/')).map_err(|e| {
                ConfigError::Invalid {
                    name: "APP_URL",
                    value: url.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        let max_requests =
            parse_var(&lookup, "RATE_LIMIT_MAX")?.unwrap_or(defaults.rate_limit.max_requests);
        let window = parse_var::<u64>(&lookup, "RATE_LIMIT_WINDOW_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.rate_limit.window);
        if window.is_zero() {
            return Err(ConfigError::Invalid {
                name: "RATE_LIMIT_WINDOW_SECS",
                value: "0".to_string(),
                reason: "window must be at least one second".to_string(),
            });
        }

        let max_clients = parse_var(&lookup, "RATE_LIMIT_MAX_CLIENTS")?
            .unwrap_or(defaults.rate_limit.max_clients);
        let trust_proxy = parse_var::<Flag>(&lookup, "TRUST_PROXY")?
            .map(|Flag(on)| on)
            .unwrap_or(defaults.rate_limit.trust_proxy);

        let body_limit_bytes =
            parse_var(&lookup, "BODY_LIMIT_BYTES")?.unwrap_or(defaults.body_limit_bytes);

        let static_dir = non_empty(&lookup, "STATIC_DIR").map(PathBuf::from);

        let log_format = parse_var(&lookup, "LOG_FORMAT")?.unwrap_or(defaults.log_format);

        Ok(Self {
            port,
            allowed_origin,
            rate_limit: RateLimitConfig {
                max_requests,
                window,
                max_clients,
                trust_proxy,
            },
            body_limit_bytes,
            static_dir,
            log_format,
        })
    }
}

/// Boolean variable: `true`/`false`, `1`/`0`, `yes`/`no`.
struct Flag(bool);

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Self(true)),
            "false" | "0" | "no" => Ok(Self(false)),
            other => Err(format!("expected true or false, got \"{other}\"")),
        }
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(lookup, name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
