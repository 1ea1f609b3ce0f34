use chrono::{DateTime, Utc};
use serde::Serialize;
use spider_rule::Rule;

/// A stored rule as returned to callers.
///
/// `rule_str` is a tab-indented view of the stored payload for display; the
/// canonical payload itself is never exposed separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleRecord {
    pub id: u64,
    pub host: String,
    pub rule: Rule,
    pub rule_str: String,
    pub last_update: DateTime<Utc>,
}

/// Result of an update: whether a stored row actually matched the id.
///
/// Updating an unknown id is not an error; callers that care can inspect
/// `matched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateOutcome {
    pub id: u64,
    pub matched: bool,
}
