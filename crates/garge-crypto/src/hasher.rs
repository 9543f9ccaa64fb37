//! Salted password hashing and verification.
//!
//! Hashes are derived over the UTF-8 bytes of the password and of the
//! hex-encoded salt string (not the raw salt bytes), which is what the broker's
//! authentication backend recomputes on every login.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Number of random salt bytes (hex-encoded to twice as many characters).
pub const DEFAULT_SALT_LEN: usize = 16;

/// PBKDF2 round count.
pub const DEFAULT_ITERATIONS: u32 = 300_000;

/// Derived hash length in bytes.
pub const DEFAULT_HASH_LEN: usize = 32;

/// Longest accepted derived hash: one SHA-512 output block.
pub const MAX_HASH_LEN: usize = 64;

/// Generate `len` random bytes from the OS CSPRNG, hex-encoded.
pub fn generate_salt(len: usize) -> Result<String, CryptoError> {
    if len == 0 {
        return Err(CryptoError::InvalidInput(
            "salt length must be greater than zero".into(),
        ));
    }
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::RandomSource(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Derive `output_len` bytes with PBKDF2-HMAC-SHA512 and return them hex-encoded.
pub fn hash_password(
    password: &str,
    salt: &str,
    iterations: u32,
    output_len: usize,
) -> Result<String, CryptoError> {
    let derived = derive_pbkdf2(password, salt, iterations, output_len)?;
    Ok(hex::encode(&*derived))
}

/// Recompute the PBKDF2 hash and compare it against `expected_hash_hex`.
///
/// Returns `Ok(false)` on mismatch. The comparison runs in constant time over
/// the derived bytes.
pub fn verify_password(
    password: &str,
    expected_hash_hex: &str,
    salt: &str,
    iterations: u32,
    output_len: usize,
) -> Result<bool, CryptoError> {
    let expected = decode_expected(expected_hash_hex)?;
    let derived = derive_pbkdf2(password, salt, iterations, output_len)?;
    Ok(derived.as_slice().ct_eq(expected.as_slice()).into())
}

/// Hex-encoded SHA-256 over `password || salt`.
///
/// No key stretching is applied, so these hashes are cheap to brute force
/// offline. Only use this for tables that still expect the legacy format.
pub fn hash_password_sha256(password: &str, salt: &str) -> Result<String, CryptoError> {
    check_secret_inputs(password, salt)?;
    Ok(hex::encode(digest_sha256(password, salt)))
}

/// Verify a password against a legacy salted SHA-256 hash.
pub fn verify_password_sha256(
    password: &str,
    expected_hash_hex: &str,
    salt: &str,
) -> Result<bool, CryptoError> {
    check_secret_inputs(password, salt)?;
    let expected = decode_expected(expected_hash_hex)?;
    let digest = digest_sha256(password, salt);
    Ok(digest.as_slice().ct_eq(expected.as_slice()).into())
}

fn derive_pbkdf2(
    password: &str,
    salt: &str,
    iterations: u32,
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    check_secret_inputs(password, salt)?;
    if iterations == 0 {
        return Err(CryptoError::InvalidInput(
            "iteration count must be greater than zero".into(),
        ));
    }
    if output_len == 0 || output_len > MAX_HASH_LEN {
        return Err(CryptoError::InvalidInput(format!(
            "hash length must be between 1 and {MAX_HASH_LEN} bytes (got {output_len})"
        )));
    }
    let mut derived = Zeroizing::new(vec![0u8; output_len]);
    pbkdf2_hmac::<Sha512>(
        password.as_bytes(),
        salt.as_bytes(),
        iterations,
        derived.as_mut_slice(),
    );
    Ok(derived)
}

fn digest_sha256(password: &str, salt: &str) -> Zeroizing<Vec<u8>> {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    Zeroizing::new(hasher.finalize().to_vec())
}

fn check_secret_inputs(password: &str, salt: &str) -> Result<(), CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::InvalidInput("password must not be empty".into()));
    }
    if salt.is_empty() {
        return Err(CryptoError::InvalidInput("salt must not be empty".into()));
    }
    Ok(())
}

fn decode_expected(expected_hash_hex: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(expected_hash_hex)
        .map_err(|e| CryptoError::InvalidInput(format!("stored hash is not valid hex: {e}")))
}

const fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

const fn default_hash_len() -> usize {
    DEFAULT_HASH_LEN
}

/// Hash scheme used for an authentication table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// PBKDF2 with HMAC-SHA512.
    Pbkdf2Sha512 {
        #[serde(default = "default_iterations")]
        iterations: u32,
        #[serde(default = "default_hash_len")]
        output_len: usize,
    },
    /// Single SHA-256 over `password || salt`. Weak.
    SaltedSha256,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Pbkdf2Sha512 {
            iterations: DEFAULT_ITERATIONS,
            output_len: DEFAULT_HASH_LEN,
        }
    }
}

impl HashAlgorithm {
    /// Hash `password` with an existing salt.
    pub fn hash(&self, password: &str, salt: &str) -> Result<String, CryptoError> {
        match *self {
            Self::Pbkdf2Sha512 {
                iterations,
                output_len,
            } => hash_password(password, salt, iterations, output_len),
            Self::SaltedSha256 => hash_password_sha256(password, salt),
        }
    }

    /// Verify `password` against a stored salt and hash.
    pub fn verify(
        &self,
        password: &str,
        expected_hash_hex: &str,
        salt: &str,
    ) -> Result<bool, CryptoError> {
        match *self {
            Self::Pbkdf2Sha512 {
                iterations,
                output_len,
            } => verify_password(password, expected_hash_hex, salt, iterations, output_len),
            Self::SaltedSha256 => verify_password_sha256(password, expected_hash_hex, salt),
        }
    }

    /// Generate a fresh salt and hash `password` with it.
    pub fn derive(&self, password: &str) -> Result<SaltedHash, CryptoError> {
        let salt = generate_salt(DEFAULT_SALT_LEN)?;
        let hash = self.hash(password, &salt)?;
        Ok(SaltedHash { salt, hash })
    }

    /// Whether this scheme lacks key stretching.
    pub const fn is_weak(&self) -> bool {
        matches!(self, Self::SaltedSha256)
    }

    /// Short name for logs and operator output.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pbkdf2Sha512 { .. } => "pbkdf2-sha512",
            Self::SaltedSha256 => "salted-sha256",
        }
    }
}

/// A salt together with the hash derived from it.
#[derive(Clone, PartialEq, Eq)]
pub struct SaltedHash {
    pub salt: String,
    pub hash: String,
}

impl std::fmt::Debug for SaltedHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaltedHash")
            .field("salt", &"[REDACTED]")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const SALT: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90";

    #[test]
    fn salt_is_hex_of_requested_length() {
        let salt = generate_salt(DEFAULT_SALT_LEN).unwrap();
        assert_eq!(salt.len(), 32);
        assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn successive_salts_differ() {
        let a = generate_salt(DEFAULT_SALT_LEN).unwrap();
        let b = generate_salt(DEFAULT_SALT_LEN).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn zero_length_salt_rejected() {
        assert!(matches!(
            generate_salt(0),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn pbkdf2_known_answer() {
        let hash = hash_password("hunter2", SALT, 1000, 32).unwrap();
        assert_eq!(
            hash,
            "f00b5bdf877c38f17a2db6b863d71d436e53efdb47ac72806b1ec60450cca122"
        );
    }

    #[test]
    fn pbkdf2_known_answer_default_parameters() {
        let hash = hash_password("hunter2", SALT, DEFAULT_ITERATIONS, DEFAULT_HASH_LEN).unwrap();
        assert_eq!(
            hash,
            "856afad30efacc235e3a53b6a875debd6c28b7ee9bad6b676cc80159c998cb00"
        );
    }

    #[test]
    fn pbkdf2_known_answer_short_output() {
        let hash = hash_password("garge", "00112233445566778899aabbccddeeff", 1, 24).unwrap();
        assert_eq!(hash, "d6d70021ddac6f402c7b2b14fb4f48790d1383a906a21c15");
        assert_eq!(hash.len(), 48);
    }

    #[test]
    fn verify_accepts_matching_password() {
        let hash = hash_password("s3cret", SALT, 1000, 32).unwrap();
        assert!(verify_password("s3cret", &hash, SALT, 1000, 32).unwrap());
    }

    #[test]
    fn verify_rejects_other_password() {
        let hash = hash_password("s3cret", SALT, 1000, 32).unwrap();
        assert!(!verify_password("s3cret!", &hash, SALT, 1000, 32).unwrap());
    }

    #[test]
    fn verify_requires_same_parameters() {
        let hash = hash_password("s3cret", SALT, 1000, 32).unwrap();
        assert!(!verify_password("s3cret", &hash, SALT, 1001, 32).unwrap());
        assert!(!verify_password("s3cret", &hash, SALT, 1000, 24).unwrap());
        assert!(!verify_password("s3cret", &hash, "00", 1000, 32).unwrap());
    }

    #[test]
    fn verify_accepts_uppercase_hex() {
        let hash = hash_password("s3cret", SALT, 10, 32).unwrap();
        assert!(verify_password("s3cret", &hash.to_uppercase(), SALT, 10, 32).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        let result = verify_password("s3cret", "not-hex", SALT, 10, 32);
        assert!(matches!(result, Err(CryptoError::InvalidInput(_))));
    }

    #[test]
    fn empty_inputs_rejected() {
        assert!(matches!(
            hash_password("", SALT, 10, 32),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            hash_password("pw", "", 10, 32),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            hash_password("pw", SALT, 0, 32),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            hash_password("pw", SALT, 10, 0),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn oversized_output_rejected_before_deriving() {
        assert!(matches!(
            hash_password("hunter2", SALT, 1, usize::MAX),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            verify_password("hunter2", "00", SALT, 1, MAX_HASH_LEN + 1),
            Err(CryptoError::InvalidInput(_))
        ));
        assert_eq!(hash_password("hunter2", SALT, 1, MAX_HASH_LEN).unwrap().len(), 128);
    }

    #[test]
    fn sha256_known_answer() {
        let hash = hash_password_sha256("hunter2", SALT).unwrap();
        assert_eq!(
            hash,
            "c4ff7a9793d3ac9bb72d52e2fa3a0f8791810a3d0f4ea0f7cc07d4a8551e3730"
        );
        assert!(verify_password_sha256("hunter2", &hash, SALT).unwrap());
        assert!(!verify_password_sha256("hunter3", &hash, SALT).unwrap());
    }

    #[test]
    fn derive_produces_verifiable_pair() {
        let algorithm = HashAlgorithm::Pbkdf2Sha512 {
            iterations: 100,
            output_len: 32,
        };
        let derived = algorithm.derive("device-pass").unwrap();
        assert_eq!(derived.salt.len(), 32);
        assert_eq!(derived.hash.len(), 64);
        assert!(algorithm.verify("device-pass", &derived.hash, &derived.salt).unwrap());
        assert!(!algorithm.verify("other-pass", &derived.hash, &derived.salt).unwrap());
    }

    #[test]
    fn derive_uses_fresh_salt_each_time() {
        let algorithm = HashAlgorithm::SaltedSha256;
        let a = algorithm.derive("same").unwrap();
        let b = algorithm.derive("same").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn weak_flag() {
        assert!(HashAlgorithm::SaltedSha256.is_weak());
        assert!(!HashAlgorithm::default().is_weak());
    }

    #[test]
    fn debug_redacts_salted_hash() {
        let pair = SaltedHash {
            salt: "abcd".into(),
            hash: "ef01".into(),
        };
        let debug = format!("{pair:?}");
        assert!(!debug.contains("abcd"));
        assert!(!debug.contains("ef01"));
    }

    #[test]
    fn algorithm_deserializes_with_defaults() {
        let algorithm: HashAlgorithm =
            serde_json::from_str(r#"{"algorithm":"pbkdf2_sha512"}"#).unwrap();
        assert_eq!(algorithm, HashAlgorithm::default());

        let algorithm: HashAlgorithm = serde_json::from_str(
            r#"{"algorithm":"pbkdf2_sha512","iterations":1000,"output_len":24}"#,
        )
        .unwrap();
        assert_eq!(
            algorithm,
            HashAlgorithm::Pbkdf2Sha512 {
                iterations: 1000,
                output_len: 24
            }
        );

        let algorithm: HashAlgorithm =
            serde_json::from_str(r#"{"algorithm":"salted_sha256"}"#).unwrap();
        assert_eq!(algorithm, HashAlgorithm::SaltedSha256);
    }
}
