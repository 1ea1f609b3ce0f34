mod fetch;
mod server;
mod store;


pub use fetch::*;
pub use server::*;
pub use store::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the spider admin server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct SpiderConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Rule store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Outbound fetch settings for rule test runs.
    #[serde(default)]
    pub fetch: FetchSettings,
}

impl SpiderConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot work at runtime.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.fetch.timeout_seconds == 0 {
            return Err(ServerError::Config(
                "[fetch] timeout_seconds must be greater than zero".into(),
            ));
        }
        if self.fetch.max_body_bytes == 0 {
            return Err(ServerError::Config(
                "[fetch] max_body_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
