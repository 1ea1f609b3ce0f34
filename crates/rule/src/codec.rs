//! Conversion between rule documents and their stored JSON form.
//!
//! The compact encoding produced by [`encode`] is the canonical payload that
//! gets persisted. [`indent`] derives a tab-indented view of stored bytes for
//! display; it is never written back to the store.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use crate::rule::Rule;

/// Errors from encoding or decoding rule payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload is not valid JSON or does not match the rule shape.
    #[error("invalid rule document: {0}")]
    Decode(#[source] serde_json::Error),

    /// The rule could not be serialized.
    #[error("failed to encode rule document: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode a rule document from raw bytes.
///
/// The error message carries serde's diagnostic (missing field, type
/// mismatch, or syntax error with line and column).
pub fn decode(bytes: &[u8]) -> Result<Rule, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}

/// Encode a rule document into its canonical compact form.
pub fn encode(rule: &Rule) -> Result<String, CodecError> {
    serde_json::to_string(rule).map_err(CodecError::Encode)
}

/// Render stored bytes as tab-indented JSON.
///
/// Object keys are emitted in sorted order, so the output is deterministic
/// for semantically equal inputs.
pub fn indent(bytes: &[u8]) -> Result<String, CodecError> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(CodecError::Decode)?;

    let mut buf = Vec::with_capacity(bytes.len() * 2);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    value
        .serialize(&mut serializer)
        .map_err(CodecError::Encode)?;

    // serde_json only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
