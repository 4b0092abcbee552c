//! Client configuration.
//!
//! # Design
//! `ClientConfig` is fixed at construction and never mutated afterwards. It
//! can be assembled in code or read from the environment (with an optional
//! `.env` file), which is how the app's build configuration hands over the
//! API base URL.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::http::BodyFormat;

/// Timeout applied to both the request and the resource phase by default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_API_URL: &str = "API_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "API_REQUEST_TIMEOUT_SECS";
pub const ENV_RESOURCE_TIMEOUT: &str = "API_RESOURCE_TIMEOUT_SECS";
pub const ENV_FORCE_DEFAULT_LOCALE: &str = "API_FORCE_DEFAULT_LOCALE";
pub const ENV_ERROR_SURFACING: &str = "API_ERROR_SURFACING";
pub const ENV_BODY_FORMAT: &str = "API_BODY_FORMAT";

/// Which error reaches the caller when a failed response carries a
/// structured JSON payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorSurfacing {
    /// Always surface the original transport failure; the structured
    /// payload is only logged.
    #[default]
    Transport,
    /// Surface the structured payload (`ServiceError::Api` or
    /// `ServiceError::UnexpectedStatus`) whenever it parses.
    Structured,
}

impl FromStr for ErrorSurfacing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transport" => Ok(ErrorSurfacing::Transport),
            "structured" => Ok(ErrorSurfacing::Structured),
            other => Err(format!("expected `transport` or `structured`, got `{other}`")),
        }
    }
}

/// Immutable per-client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix joined verbatim with every request path.
    pub base_api_url: String,
    /// Time allowed to connect, and between reads once connected.
    pub request_timeout: Duration,
    /// Time allowed for the whole call, body included.
    pub resource_timeout: Duration,
    /// Send `en-US` regardless of the stored locale. Used by simulator and
    /// test builds.
    pub force_default_locale: bool,
    pub error_surfacing: ErrorSurfacing,
    pub body_format: BodyFormat,
}

impl ClientConfig {
    pub fn new(base_api_url: impl Into<String>) -> Self {
        Self {
            base_api_url: base_api_url.into(),
            request_timeout: DEFAULT_TIMEOUT,
            resource_timeout: DEFAULT_TIMEOUT,
            force_default_locale: false,
            error_surfacing: ErrorSurfacing::default(),
            body_format: BodyFormat::default(),
        }
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn resource_timeout(mut self, timeout: Duration) -> Self {
        self.resource_timeout = timeout;
        self
    }

    pub fn force_default_locale(mut self, force: bool) -> Self {
        self.force_default_locale = force;
        self
    }

    pub fn error_surfacing(mut self, surfacing: ErrorSurfacing) -> Self {
        self.error_surfacing = surfacing;
        self
    }

    pub fn body_format(mut self, body_format: BodyFormat) -> Self {
        self.body_format = body_format;
        self
    }

    /// Read the configuration from the process environment, loading a `.env`
    /// file first if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_api_url = lookup(ENV_API_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_API_URL))?;
        let mut config = Self::new(base_api_url);

        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = parse_timeout(ENV_REQUEST_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_RESOURCE_TIMEOUT) {
            config.resource_timeout = parse_timeout(ENV_RESOURCE_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FORCE_DEFAULT_LOCALE) {
            config.force_default_locale = parse_flag(ENV_FORCE_DEFAULT_LOCALE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ERROR_SURFACING) {
            config.error_surfacing = raw.parse().map_err(|reason| ConfigError::Invalid {
                key: ENV_ERROR_SURFACING,
                value: raw.clone(),
                reason,
            })?;
        }
        if let Some(raw) = lookup(ENV_BODY_FORMAT) {
            config.body_format = raw.parse().map_err(|reason| ConfigError::Invalid {
                key: ENV_BODY_FORMAT,
                value: raw.clone(),
                reason,
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no client could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_api_url.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_API_URL));
        }
        for (key, timeout) in [
            (ENV_REQUEST_TIMEOUT, self.request_timeout),
            (ENV_RESOURCE_TIMEOUT, self.resource_timeout),
        ] {
            if timeout.is_zero() {
                return Err(ConfigError::Invalid {
                    key,
                    value: "0".to_string(),
                    reason: "timeout must be positive".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_timeout(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: "expected a number of seconds".to_string(),
    })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "timeout must be positive".to_string(),
        });
    }
    Ok(Duration::from_secs_f64(secs))
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
