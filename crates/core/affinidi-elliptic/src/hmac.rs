//! HMAC message authentication codes

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use crate::{CryptoError, digest::DigestAlgorithm, error::Result};

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

fn tag<M: Mac + hmac::digest::KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <M as hmac::digest::KeyInit>::new_from_slice(key)
        .map_err(|e| CryptoError::Derivation(format!("HMAC key init failed: {e}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn check<M: Mac + hmac::digest::KeyInit>(key: &[u8], message: &[u8], expected: &[u8]) -> Result<bool> {
    let mut mac = <M as hmac::digest::KeyInit>::new_from_slice(key)
        .map_err(|e| CryptoError::Derivation(format!("HMAC key init failed: {e}")))?;
    mac.update(message);
    Ok(mac.verify_slice(expected).is_ok())
}

/// Computes HMAC over `message` with `key` (any length)
pub fn compute(key: &[u8], message: &[u8], algorithm: DigestAlgorithm) -> Result<Vec<u8>> {
    match algorithm {
        DigestAlgorithm::Sha256 => tag::<HmacSha256>(key, message),
        DigestAlgorithm::Sha384 => tag::<HmacSha384>(key, message),
        DigestAlgorithm::Sha512 => tag::<HmacSha512>(key, message),
    }
}

/// Verifies an HMAC tag in constant time.
/// A mismatching tag is `Ok(false)`.
pub fn verify(
    key: &[u8],
    message: &[u8],
    expected: &[u8],
    algorithm: DigestAlgorithm,
) -> Result<bool> {
    match algorithm {
        DigestAlgorithm::Sha256 => check::<HmacSha256>(key, message, expected),
        DigestAlgorithm::Sha384 => check::<HmacSha384>(key, message, expected),
        DigestAlgorithm::Sha512 => check::<HmacSha512>(key, message, expected),
    }
}
