pub mod codec;
pub mod document;
pub mod error;
pub mod rule;

pub use codec::CodecError;
pub use document::Document;
pub use error::RuleError;
pub use rule::{CompiledRule, DEFAULT_ATTRIBUTE, DEFAULT_LINK_SELECTOR, Rule};
