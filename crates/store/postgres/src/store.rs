use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use spider_store::error::StoreError;
use spider_store::store::{RuleStore, StoredRule};

use crate::config::PostgresConfig;
use crate::migrations;

type RuleRow = (i64, String, String, DateTime<Utc>);

/// Build `PgConnectOptions` from a [`PostgresConfig`], applying SSL settings
/// when configured.
pub(crate) fn build_connect_options(
    config: &PostgresConfig,
) -> Result<sqlx::postgres::PgConnectOptions, StoreError> {
    let mut options: sqlx::postgres::PgConnectOptions = config
        .url
        .parse()
        .map_err(|e: sqlx::Error| StoreError::Connection(e.to_string()))?;

    if let Some(ref mode) = config.ssl_mode {
        let ssl_mode = match mode.as_str() {
            "disable" => sqlx::postgres::PgSslMode::Disable,
            "prefer" => sqlx::postgres::PgSslMode::Prefer,
            "require" => sqlx::postgres::PgSslMode::Require,
            "verify-ca" => sqlx::postgres::PgSslMode::VerifyCa,
            "verify-full" => sqlx::postgres::PgSslMode::VerifyFull,
            other => {
                return Err(StoreError::Connection(format!("unknown ssl_mode: {other}")));
            }
        };
        options = options.ssl_mode(ssl_mode);
    }

    if let Some(ref path) = config.ssl_root_cert {
        options = options.ssl_root_cert(path);
    }

    Ok(options)
}

/// Map a `sqlx` error onto the store taxonomy: pool and I/O failures mean the
/// database is unreachable, everything else is a backend failure.
fn map_sqlx_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Connection(e.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

fn row_to_rule((id, host, json, updated): RuleRow) -> Result<StoredRule, StoreError> {
    let id = u64::try_from(id)
        .map_err(|_| StoreError::Serialization(format!("negative rule id {id}")))?;
    Ok(StoredRule {
        id,
        host,
        json,
        updated,
    })
}

/// PostgreSQL-backed implementation of [`RuleStore`].
///
/// Uses `sqlx::PgPool` for connection pooling; every operation checks a
/// connection out of the pool and returns it when the query completes or
/// fails. Ids come from a `BIGSERIAL` sequence and are never reused.
pub struct PostgresRuleStore {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl PostgresRuleStore {
    /// Create a new `PostgresRuleStore` from the provided configuration.
    ///
    /// Connects to `PostgreSQL`, creates the connection pool, and runs
    /// migrations to ensure the rules table exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if pool creation fails, or
    /// [`StoreError::Backend`] if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StoreError> {
        let connect_options = build_connect_options(&config)?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Self::from_pool(pool, config).await
    }

    /// Create a `PostgresRuleStore` from an existing pool and config.
    ///
    /// Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if migrations fail.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, StoreError> {
        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        debug!(table = %config.rules_table(), "rule store migrations applied");

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }
}

#[async_trait]
impl RuleStore for PostgresRuleStore {
    async fn list(&self) -> Result<Vec<StoredRule>, StoreError> {
        let table = self.config.rules_table();
        let query = format!("SELECT id, host, json, updated FROM {table} ORDER BY host, id");

        let rows: Vec<RuleRow> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        rows.into_iter().map(row_to_rule).collect()
    }

    async fn get(&self, id: u64) -> Result<Option<StoredRule>, StoreError> {
        // Ids above i64::MAX can never have been assigned by the sequence.
        let Ok(id) = i64::try_from(id) else {
            return Ok(None);
        };
        let table = self.config.rules_table();
        let query = format!("SELECT id, host, json, updated FROM {table} WHERE id = $1");

        let row: Option<RuleRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        row.map(row_to_rule).transpose()
    }

    async fn create(&self, host: &str, json: &str) -> Result<u64, StoreError> {
        let table = self.config.rules_table();
        let query = format!(
            "INSERT INTO {table} (host, json, updated) VALUES ($1, $2, NOW()) RETURNING id"
        );

        let (id,): (i64,) = sqlx::query_as(&query)
            .bind(host)
            .bind(json)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        u64::try_from(id).map_err(|_| StoreError::Serialization(format!("negative rule id {id}")))
    }

    async fn update(&self, id: u64, host: &str, json: &str) -> Result<bool, StoreError> {
        let Ok(id) = i64::try_from(id) else {
            return Ok(false);
        };
        let table = self.config.rules_table();
        let query = format!("UPDATE {table} SET host = $1, json = $2, updated = NOW() WHERE id = $3");

        let result = sqlx::query(&query)
            .bind(host)
            .bind(json)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let Ok(id) = i64::try_from(id) else {
            return Ok(false);
        };
        let table = self.config.rules_table();
        let query = format!("DELETE FROM {table} WHERE id = $1");

        let result = sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
