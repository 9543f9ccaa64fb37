//! `garge` credential hashing library
//!
//! Derives and verifies the salted password hashes stored for MQTT
//! identities in the broker's authentication table.
//!
//! ## Primitives
//!
//! - **Salt**: 16 random bytes from the OS CSPRNG, hex-encoded
//! - **Hash**: PBKDF2 with HMAC-SHA512, 300 000 rounds, 32-byte output, hex-encoded
//! - **Legacy**: SHA-256 over `password || salt` (weak, kept for older tables)
//! - **Verification**: constant-time comparison of the derived bytes

pub mod error;
pub mod hasher;
pub mod secret;

pub use error::CryptoError;
pub use hasher::{
    DEFAULT_HASH_LEN, DEFAULT_ITERATIONS, DEFAULT_SALT_LEN, HashAlgorithm, MAX_HASH_LEN, SaltedHash,
    generate_salt, hash_password, hash_password_sha256, verify_password, verify_password_sha256,
};
pub use secret::{DEFAULT_DEVICE_PASSWORD_LEN, generate_device_password};
