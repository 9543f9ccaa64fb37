//! Random secrets for newly provisioned devices.

use rand::Rng;
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// Length of a generated device password.
pub const DEFAULT_DEVICE_PASSWORD_LEN: usize = 22;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generate a URL-safe random password of `len` characters.
///
/// The result only contains characters that survive the broker's MQTT
/// CONNECT packet and the device's EEPROM store without escaping.
pub fn generate_device_password(len: usize) -> Result<String, CryptoError> {
    if len < 12 {
        return Err(CryptoError::InvalidInput(format!(
            "device password must be at least 12 characters (got {len})"
        )));
    }
    let mut rng = OsRng;
    Ok((0..len)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            char::from(CHARSET[idx])
        })
        .collect())
}
