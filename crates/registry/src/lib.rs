pub mod error;
pub mod fetch;
pub mod record;
pub mod registry;
pub mod runner;

pub use error::RegistryError;
pub use fetch::{FetchConfig, FetchError, Fetcher, HttpFetcher, Page};
pub use record::{RuleRecord, UpdateOutcome};
pub use registry::RuleRegistry;
pub use runner::TestRunner;
