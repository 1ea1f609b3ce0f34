use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator: `"ok"` or `"degraded"`.
    #[schema(example = "ok")]
    pub status: String,
    /// Rule store status: `"ok"` or the store error.
    #[schema(example = "ok")]
    pub store: String,
}

/// Identifier assigned to a newly created rule.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedRule {
    /// Store-assigned rule id.
    #[schema(example = 42)]
    pub id: u64,
}

/// A stored rule as it appears in `Response` (documentation only).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct RuleRecordSchema {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = "example.com")]
    pub host: String,
    /// The decoded rule document.
    #[schema(value_type = Object)]
    pub rule: serde_json::Value,
    /// Tab-indented view of the stored document.
    pub rule_str: String,
    /// Time of the last create or update (RFC 3339).
    #[schema(example = "2024-05-01T12:00:00Z")]
    pub last_update: String,
}

/// Outcome of an update (documentation only).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateOutcomeSchema {
    #[schema(example = 42)]
    pub id: u64,
    /// `false` when no stored rule had the id; the update is still reported
    /// as a success.
    pub matched: bool,
}
