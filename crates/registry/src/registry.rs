use std::sync::Arc;

use spider_rule::{CodecError, Rule, codec};
use spider_store::{RuleStore, StoredRule};
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::record::{RuleRecord, UpdateOutcome};

/// CRUD over stored rules with validation before anything is persisted.
///
/// The registry holds no state of its own: every call round-trips to the
/// store, so concurrent writers to the same id simply race and the last
/// write wins.
pub struct RuleRegistry {
    store: Arc<dyn RuleStore>,
}

impl RuleRegistry {
    /// Create a registry over the given store.
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    /// List every rule ordered by host, then id.
    pub async fn list(&self) -> Result<Vec<RuleRecord>, RegistryError> {
        let rows = self.store.list().await?;
        rows.into_iter().map(to_record).collect()
    }

    /// Get a rule by id.
    pub async fn get(&self, id: u64) -> Result<RuleRecord, RegistryError> {
        let row = self
            .store
            .get(id)
            .await?
            .ok_or(RegistryError::NotFound(id))?;
        to_record(row)
    }

    /// Decode `document`, then persist it under `host`. Returns the id the
    /// store assigned.
    pub async fn create(&self, host: &str, document: &[u8]) -> Result<u64, RegistryError> {
        let json = canonicalize(document)?;
        let id = self.store.create(host, &json).await?;
        info!(id, host, "rule created");
        Ok(id)
    }

    /// Decode `document`, then overwrite the rule stored under `id`.
    ///
    /// An unknown id is not an error; the store simply matches no row and
    /// the returned outcome reports `matched == false`.
    pub async fn update(
        &self,
        id: u64,
        host: &str,
        document: &[u8],
    ) -> Result<UpdateOutcome, RegistryError> {
        let json = canonicalize(document)?;
        let matched = self.store.update(id, host, &json).await?;
        if matched {
            info!(id, host, "rule updated");
        } else {
            warn!(id, host, "update matched no stored rule");
        }
        Ok(UpdateOutcome { id, matched })
    }

    /// Delete the rule stored under `id`. Deleting an unknown id succeeds.
    pub async fn delete(&self, id: u64) -> Result<(), RegistryError> {
        let existed = self.store.delete(id).await?;
        if existed {
            info!(id, "rule deleted");
        } else {
            debug!(id, "delete matched no stored rule");
        }
        Ok(())
    }

    /// Check a candidate document without touching the store.
    ///
    /// The document must decode and pass the rule engine's own validation
    /// (start URL, selectors, patterns).
    pub fn validate(document: &[u8]) -> Result<Rule, RegistryError> {
        let rule = codec::decode(document).map_err(RegistryError::InvalidDocument)?;
        rule.validate().map_err(RegistryError::InvalidRule)?;
        Ok(rule)
    }
}

/// Decode a candidate payload and re-encode it in canonical form.
fn canonicalize(document: &[u8]) -> Result<String, RegistryError> {
    let rule = codec::decode(document).map_err(RegistryError::InvalidDocument)?;
    codec::encode(&rule).map_err(RegistryError::InvalidDocument)
}

fn to_record(row: StoredRule) -> Result<RuleRecord, RegistryError> {
    let corrupt = |source: CodecError| RegistryError::Corrupt { id: row.id, source };
    let rule = codec::decode(row.json.as_bytes()).map_err(corrupt)?;
    let rule_str = codec::indent(row.json.as_bytes()).map_err(corrupt)?;

    Ok(RuleRecord {
        id: row.id,
        host: row.host,
        rule,
        rule_str,
        last_update: row.updated,
    })
}
