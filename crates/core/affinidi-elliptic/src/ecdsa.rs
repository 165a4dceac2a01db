//! ECDSA over caller supplied digests
//!
//! Signatures are fixed width `r || s`, each half `curve.field_size()` bytes
//! big-endian. The digest is used as-is; hash the message first (see
//! [`crate::digest`]) or use [`crate::ecc::Ecc::sign`] which does it for you.

use tracing::debug;

use crate::{CryptoError, error::Result, key::KeyPair};

fn signing_scalar(key: &KeyPair) -> Result<&[u8]> {
    key.private_bytes()
        .map(|s| s.as_bytes())
        .ok_or_else(|| CryptoError::Signing("Key has no private scalar".into()))
}

/// Deterministic (RFC 6979) signature over `digest`.
/// The same key and digest always produce the same signature.
pub fn sign(digest: &[u8], key: &KeyPair) -> Result<Vec<u8>> {
    let scalar = signing_scalar(key)?;
    let signature = key.ops()?.sign_prehash(scalar, digest, false)?;
    debug!("{}: signed {} byte digest", key.curve(), digest.len());
    Ok(signature)
}

/// Signature with fresh entropy mixed into the nonce
pub fn sign_randomized(digest: &[u8], key: &KeyPair) -> Result<Vec<u8>> {
    let scalar = signing_scalar(key)?;
    key.ops()?.sign_prehash(scalar, digest, true)
}

/// Verifies `signature` over `digest` against the public point of `key`.
///
/// A signature of the wrong length is [`CryptoError::InvalidSignatureEncoding`];
/// any well formed signature that doesn't verify is `Ok(false)`.
pub fn verify(digest: &[u8], signature: &[u8], key: &KeyPair) -> Result<bool> {
    let expected = 2 * key.curve().field_size();
    if signature.len() != expected {
        return Err(CryptoError::InvalidSignatureEncoding(format!(
            "{} signatures are {expected} bytes, got {}",
            key.curve(),
            signature.len()
        )));
    }
    key.ops()?
        .verify_prehash(&key.export_public(), digest, signature)
}
