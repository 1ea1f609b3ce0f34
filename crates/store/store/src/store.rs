use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// A rule row as persisted by a [`RuleStore`].
///
/// `json` is the canonical serialized rule document; stores treat it as an
/// opaque string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRule {
    pub id: u64,
    pub host: String,
    pub json: String,
    pub updated: DateTime<Utc>,
}

/// Trait for persisting rule rows.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Writes to the same row are last-writer-wins; no versioning is applied.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Return every row ordered by `host` ascending, then `id` ascending.
    async fn list(&self) -> Result<Vec<StoredRule>, StoreError>;

    /// Get a row by id. Returns `None` if no row has that id.
    async fn get(&self, id: u64) -> Result<Option<StoredRule>, StoreError>;

    /// Insert a new row and return the id assigned to it.
    ///
    /// Ids are never reused, even after the row is deleted.
    async fn create(&self, host: &str, json: &str) -> Result<u64, StoreError>;

    /// Overwrite the host and payload of an existing row and refresh its
    /// `updated` timestamp. Returns `true` if a row matched `id`.
    async fn update(&self, id: u64, host: &str, json: &str) -> Result<bool, StoreError>;

    /// Delete a row. Returns `true` if the row existed.
    async fn delete(&self, id: u64) -> Result<bool, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Release backend resources before shutdown.
    async fn close(&self) {}
}
