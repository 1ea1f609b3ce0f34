use std::time::Duration;

use serde::Deserialize;
use spider_registry::FetchConfig;

/// Outbound HTTP settings for rule test runs.
#[derive(Debug, Deserialize)]
pub struct FetchSettings {
    /// Total request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Largest page body accepted, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Override for the `User-Agent` header.
    pub user_agent: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: None,
        }
    }
}

impl FetchSettings {
    /// Convert into the fetcher's runtime configuration.
    pub fn to_fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            timeout: Duration::from_secs(self.timeout_seconds),
            max_body_bytes: self.max_body_bytes,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_max_body_bytes() -> usize {
    5 * 1024 * 1024
}
