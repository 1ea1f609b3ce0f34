use thiserror::Error;

/// Errors raised by the rule engine while validating or applying a rule.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The `start` field is empty, unparseable, or not an absolute http(s) URL.
    #[error("invalid start URL '{url}': {reason}")]
    InvalidStart { url: String, reason: String },

    /// A link selector failed to parse as CSS.
    #[error("invalid link selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// An accept or reject pattern failed to compile.
    #[error("invalid {list} pattern '{pattern}': {source}")]
    InvalidPattern {
        list: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The link attribute name is blank.
    #[error("link attribute must not be empty")]
    EmptyAttribute,

    /// The base URL cannot anchor relative links (e.g. `data:` URLs).
    #[error("base URL cannot be used to resolve links: {0}")]
    InvalidBase(String),
}
