use crate::error::{BotError, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote API configuration
    pub api: ApiConfig,
    /// Proxy validation and retry configuration
    pub proxy: ProxyConfig,
    /// Pacing delays
    pub delays: DelayConfig,
    /// Credential and proxy list locations
    pub files: FileConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Wall-clock bound for a single request attempt
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Attempts through a proxy before falling back to a direct connection
    pub max_retries: u32,
    /// Pause between soft-failed proxy attempts
    pub retry_delay: Duration,
    /// IP echo endpoint used to validate proxies
    pub probe_url: String,
    /// Timeout for a single probe
    pub probe_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DelayConfig {
    /// Pause between network calls inside one task
    pub between_requests: Duration,
    /// Pause after each processed task
    pub between_tasks: Duration,
    /// Pause between accounts (not after the last one)
    pub between_accounts: Duration,
}

#[derive(Debug, Clone)]
pub struct FileConfig {
    /// One cookie token per line
    pub cookie_file: String,
    /// One proxy per line
    pub proxy_file: String,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.fardog.xyz/api".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            probe_url: "https://api.ipify.org?format=json".to_string(),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            between_requests: Duration::from_millis(1000),
            between_tasks: Duration::from_millis(2000),
            between_accounts: Duration::from_millis(5000),
        }
    }
}

impl DelayConfig {
    /// No pacing at all
    pub fn none() -> Self {
        Self {
            between_requests: Duration::ZERO,
            between_tasks: Duration::ZERO,
            between_accounts: Duration::ZERO,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = get_env_or("FARDOG_BASE_URL", "https://api.fardog.xyz/api");
        Url::parse(&base_url).map_err(|e| {
            BotError::InvalidConfig(format!("FARDOG_BASE_URL must be a valid URL: {}", e))
        })?;

        let max_retries: u32 = parse_env("PROXY_MAX_RETRIES", "3")?;
        if max_retries == 0 {
            return Err(BotError::InvalidConfig(
                "PROXY_MAX_RETRIES must be at least 1".into(),
            ));
        }

        Ok(Config {
            api: ApiConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                request_timeout: Duration::from_secs(parse_env("FARDOG_REQUEST_TIMEOUT", "10")?),
            },
            proxy: ProxyConfig {
                max_retries,
                retry_delay: Duration::from_millis(parse_env("PROXY_RETRY_DELAY_MS", "1000")?),
                probe_url: get_env_or("PROXY_PROBE_URL", "https://api.ipify.org?format=json"),
                probe_timeout: Duration::from_secs(parse_env("PROXY_PROBE_TIMEOUT", "5")?),
            },
            delays: DelayConfig {
                between_requests: Duration::from_millis(parse_env(
                    "DELAY_BETWEEN_REQUESTS_MS",
                    "1000",
                )?),
                between_tasks: Duration::from_millis(parse_env("DELAY_BETWEEN_TASKS_MS", "2000")?),
                between_accounts: Duration::from_millis(parse_env(
                    "DELAY_BETWEEN_ACCOUNTS_MS",
                    "5000",
                )?),
            },
            files: FileConfig {
                cookie_file: get_env_or("COOKIE_FILE", "data.txt"),
                proxy_file: get_env_or("PROXY_FILE", "proxies.txt"),
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "pretty"),
            },
        })
    }

    /// Default tracing filter directive built from the log level
    pub fn log_filter(&self) -> String {
        format!("fardog={}", self.log.level)
    }
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a numeric environment variable, rejecting garbage instead of
/// silently falling back
fn parse_env<T: FromStr>(key: &str, default: &str) -> Result<T> {
    get_env_or(key, default)
        .trim()
        .parse()
        .map_err(|_| BotError::InvalidConfig(format!("{} must be a valid number", key)))
}
