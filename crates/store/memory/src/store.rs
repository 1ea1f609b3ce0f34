use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use spider_store::error::StoreError;
use spider_store::store::{RuleStore, StoredRule};

/// In-memory [`RuleStore`] backed by a [`DashMap`].
///
/// Ids come from a monotonically increasing counter starting at 1, so they
/// are never reused. Contents are lost when the process exits; intended for
/// development and tests.
#[derive(Debug)]
pub struct MemoryRuleStore {
    rows: DashMap<u64, StoredRule>,
    next_id: AtomicU64,
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryRuleStore {
    /// Create a new, empty in-memory rule store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn list(&self) -> Result<Vec<StoredRule>, StoreError> {
        let mut rows: Vec<StoredRule> = self.rows.iter().map(|r| r.value().clone()).collect();
        rows.sort_by(|a, b| a.host.cmp(&b.host).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn get(&self, id: u64) -> Result<Option<StoredRule>, StoreError> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn create(&self, host: &str, json: &str) -> Result<u64, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.rows.insert(
            id,
            StoredRule {
                id,
                host: host.to_owned(),
                json: json.to_owned(),
                updated: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn update(&self, id: u64, host: &str, json: &str) -> Result<bool, StoreError> {
        let Some(mut row) = self.rows.get_mut(&id) else {
            return Ok(false);
        };
        host.clone_into(&mut row.host);
        json.clone_into(&mut row.json);
        row.updated = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.rows.remove(&id).is_some())
    }
}
