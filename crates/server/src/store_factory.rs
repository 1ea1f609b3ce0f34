use std::sync::Arc;

use spider_store::RuleStore;
use spider_store_memory::MemoryRuleStore;
#[cfg(feature = "postgres")]
use spider_store_postgres::{PostgresConfig, PostgresRuleStore};

use crate::config::StoreConfig;
use crate::error::ServerError;

/// Create a rule store from the given configuration.
#[allow(clippy::unused_async)]
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn RuleStore>, ServerError> {
    let store: Arc<dyn RuleStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryRuleStore::new()),
        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = config.url.as_deref().ok_or_else(|| {
                ServerError::Config("postgres backend requires [store] url".into())
            })?;

            let defaults = PostgresConfig::default();
            let pg_config = PostgresConfig {
                url: url.to_owned(),
                pool_size: config.pool_size,
                schema: config.schema.clone().unwrap_or(defaults.schema),
                table_prefix: config.prefix.clone().unwrap_or(defaults.table_prefix),
                ssl_mode: config.ssl_mode.clone(),
                ssl_root_cert: config.ssl_root_cert.clone(),
                ..defaults
            };

            Arc::new(PostgresRuleStore::new(pg_config).await?)
        }
        other => {
            return Err(ServerError::Config(format!(
                "unsupported store backend: {other}"
            )));
        }
    };

    Ok(store)
}
