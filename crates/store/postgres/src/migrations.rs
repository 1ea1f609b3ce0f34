use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Run database migrations, creating the rules table if it does not exist.
///
/// The `(host, id)` index backs the ordering used by list queries.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let rules_table = config.rules_table();

    let create_rules = format!(
        "CREATE TABLE IF NOT EXISTS {rules_table} (
            id BIGSERIAL PRIMARY KEY,
            host TEXT NOT NULL,
            json TEXT NOT NULL,
            updated TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"
    );

    let create_host_idx = format!(
        "CREATE INDEX IF NOT EXISTS {} ON {rules_table} (host, id)",
        config.host_index()
    );

    sqlx::query(&create_rules).execute(pool).await?;
    sqlx::query(&create_host_idx).execute(pool).await?;

    Ok(())
}
