use thiserror::Error;

use spider_store::StoreError;

/// Errors that can occur while starting or running the spider server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The rule store could not be constructed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
