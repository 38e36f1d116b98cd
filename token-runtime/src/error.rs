//! Error types for the runtime

use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Runtime errors
#[derive(Error, Debug)]
pub enum Error {
    /// Error surfaced by the contract
    #[error(transparent)]
    Ledger(#[from] token_ledger::Error),

    /// Actor mailbox or response channel closed
    #[error("Concurrency error: {0}")]
    Concurrency(String),
}
