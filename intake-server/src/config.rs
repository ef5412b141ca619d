//! Server configuration - environment loading
//!
//! Configuration is loaded from environment variables:
//! - `DATABASE_URL` (or legacy `MONGODB_URI`): store connection string
//! - `APP_ENV`: environment label (default: development)
//! - `ADMIN_KEY`: key required by `GET /contacts` in production
//! - `ALLOWED_ORIGINS`: comma-separated CORS allow-list
//! - `RATE_LIMIT_MAX` / `RATE_LIMIT_WINDOW_SECS`: per-client request ceiling
//! - `ACCEPT_WHEN_OFFLINE`: answer 200 for submissions while the store is down
//! - `TRUST_PROXY`: take the client address from `X-Forwarded-For` (default: true)

use std::fmt;
use std::time::Duration;

/// Origins allowed when `ALLOWED_ORIGINS` is not set
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://isothermica.com.br",
    "https://www.isothermica.com.br",
    "https://isothermica-backend-api-v2.vercel.app",
    "https://isothermica-backend.vercel.app",
    "https://landing-page-six-delta-69.vercel.app",
];

const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

/// Deployment environment label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Other(String),
}

impl Environment {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "" | "development" | "dev" => Self::Development,
            "production" | "prod" => Self::Production,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether error details may be echoed back to callers
    pub fn exposes_error_details(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-window rate limit settings
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX,
            window: DEFAULT_RATE_LIMIT_WINDOW,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Store connection string; `None` means every store access reports unavailable
    pub database_url: Option<String>,
    pub environment: Environment,
    pub admin_key: Option<String>,
    pub allowed_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
    /// Soft-success policy for `POST /contact` when the store is unreachable
    pub accept_when_offline: bool,
    /// Whether one reverse proxy hop sits in front of the server
    pub trust_proxy: bool,
}

impl AppConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from an arbitrary variable lookup (for testing)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").or_else(|| non_empty("MONGODB_URI"));

        let environment = non_empty("APP_ENV")
            .map(|label| Environment::parse(&label))
            .unwrap_or(Environment::Development);

        let allowed_origins = match non_empty("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let mut rate_limit = RateLimitConfig::default();
        if let Some(raw) = non_empty("RATE_LIMIT_MAX") {
            rate_limit.max_requests = parse_number("RATE_LIMIT_MAX", &raw)?;
        }
        if let Some(raw) = non_empty("RATE_LIMIT_WINDOW_SECS") {
            rate_limit.window = Duration::from_secs(parse_number("RATE_LIMIT_WINDOW_SECS", &raw)?);
        }

        let accept_when_offline = match non_empty("ACCEPT_WHEN_OFFLINE") {
            Some(raw) => parse_flag("ACCEPT_WHEN_OFFLINE", &raw)?,
            None => false,
        };

        let trust_proxy = match non_empty("TRUST_PROXY") {
            Some(raw) => parse_flag("TRUST_PROXY", &raw)?,
            None => true,
        };

        Ok(Self {
            database_url,
            environment,
            admin_key: non_empty("ADMIN_KEY"),
            allowed_origins,
            rate_limit,
            accept_when_offline,
            trust_proxy,
        })
    }

    /// In-process store config for local runs and tests
    pub fn in_memory() -> Self {
        Self {
            database_url: Some("memory://".to_string()),
            environment: Environment::Development,
            admin_key: None,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
            rate_limit: RateLimitConfig::default(),
            accept_when_offline: false,
            trust_proxy: true,
        }
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_owned(),
    })
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_owned(),
        }),
    }
}
