//! Error types for `garge` core library.

use thiserror::Error;

use crate::db::StoreError;

/// Result type alias using `garge` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for provisioning operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied an unusable identity or rule set
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Hashing error
    #[error("Credential hashing failed: {0}")]
    Crypto(#[from] garge_crypto::CryptoError),
}
