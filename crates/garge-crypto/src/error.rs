//! Crypto error types.

/// Errors from credential hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Random source failed: {0}")]
    RandomSource(String),
}
