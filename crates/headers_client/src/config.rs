//! Client configuration.
//!
//! Values come from the environment (`HEADERS_*` variables) and may be overridden by
//! the command line. Durations are whole seconds in the environment.
use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::resolver::ForkPolicy;

pub const DEFAULT_TIP_FRESHNESS: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const TIP_QUEUE_CAPACITY: usize = 1000;

pub const ENV_URL: &str = "HEADERS_URL";
pub const ENV_API_KEY: &str = "HEADERS_API_KEY";
pub const ENV_TIP_FRESHNESS: &str = "HEADERS_TIP_FRESHNESS_SECS";
pub const ENV_REQUEST_TIMEOUT: &str = "HEADERS_REQUEST_TIMEOUT_SECS";
pub const ENV_STRICT_FORKS: &str = "HEADERS_STRICT_FORKS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the header service, e.g. `https://headers.example.com`.
    pub url: String,
    /// Bearer credential sent with every request.
    pub api_key: String,
    /// How long a fetched tip is served from cache before a refresh hits the network.
    pub tip_freshness: Duration,
    pub request_timeout: Duration,
    /// Bound of the tip-change notification queue.
    pub tip_queue_capacity: usize,
    pub fork_policy: ForkPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            tip_freshness: DEFAULT_TIP_FRESHNESS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tip_queue_capacity: TIP_QUEUE_CAPACITY,
            fork_policy: ForkPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_URL)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(ENV_URL))?;
        let api_key = lookup(ENV_API_KEY)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(ENV_API_KEY))?;

        let mut config = Self::new(url, api_key);
        if let Some(secs) = lookup(ENV_TIP_FRESHNESS) {
            config.tip_freshness = parse_secs(ENV_TIP_FRESHNESS, &secs)?;
        }
        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = parse_secs(ENV_REQUEST_TIMEOUT, &secs)?;
        }
        if let Some(flag) = lookup(ENV_STRICT_FORKS) {
            config.fork_policy = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => ForkPolicy::Strict,
                "0" | "false" | "no" | "" => ForkPolicy::BestEffort,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: ENV_STRICT_FORKS,
                        value: flag,
                    });
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::Missing(ENV_URL));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Missing(ENV_API_KEY));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Zero("request_timeout"));
        }
        if self.tip_queue_capacity == 0 {
            return Err(ConfigError::Zero("tip_queue_capacity"));
        }
        Ok(())
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
}
