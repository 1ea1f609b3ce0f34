use spider_rule::{CodecError, RuleError};
use spider_store::StoreError;
use thiserror::Error;

use crate::fetch::FetchError;

/// Errors surfaced by registry, validation, and test-run operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The payload is not a structurally valid rule document.
    #[error("{0}")]
    InvalidDocument(#[source] CodecError),

    /// The rule decoded but failed the engine's own validation.
    #[error("invalid rule: {0}")]
    InvalidRule(#[source] RuleError),

    /// The start URL of a test run is malformed.
    #[error("invalid start URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No rule has the requested id.
    #[error("rule not found: {0}")]
    NotFound(u64),

    /// The page for a test run could not be fetched.
    #[error("fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    /// The rule engine failed while extracting links from the fetched page.
    #[error("extraction failed: {0}")]
    ExtractionFailed(#[source] RuleError),

    /// The rule store could not be reached or rejected the operation.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// A stored payload no longer decodes into a rule document.
    #[error("rule {id} is corrupt: {source}")]
    Corrupt {
        id: u64,
        #[source]
        source: CodecError,
    },
}

impl RegistryError {
    /// Returns `true` for failures caused by the request itself rather than
    /// by infrastructure or stored data.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDocument(_)
                | Self::InvalidRule(_)
                | Self::InvalidUrl { .. }
                | Self::NotFound(_)
                | Self::ExtractionFailed(_)
        )
    }

    /// Returns `true` for failures that indicate store or data-integrity
    /// trouble and should be logged as operational events.
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Corrupt { .. })
    }
}
