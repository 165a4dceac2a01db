//! PBKDF2 password based key derivation (HMAC PRF)

use hmac::Hmac;
use sha2::{Sha256, Sha384, Sha512};

use crate::{CryptoError, SecretBuffer, digest::DigestAlgorithm, error::Result};

/// Derives `output_length` bytes from `password` and `salt`.
///
/// Fails with [`CryptoError::Derivation`] if `iterations` or `output_length`
/// is zero.
pub fn derive(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_length: usize,
    algorithm: DigestAlgorithm,
) -> Result<SecretBuffer> {
    if iterations < 1 {
        return Err(CryptoError::Derivation(
            "PBKDF2 iteration count must be at least 1".into(),
        ));
    }
    if output_length < 1 {
        return Err(CryptoError::Derivation(
            "PBKDF2 output length must be at least 1".into(),
        ));
    }

    let mut output = SecretBuffer::new(output_length);
    let result = match algorithm {
        DigestAlgorithm::Sha256 => {
            pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, output.as_mut_bytes())
        }
        DigestAlgorithm::Sha384 => {
            pbkdf2::pbkdf2::<Hmac<Sha384>>(password, salt, iterations, output.as_mut_bytes())
        }
        DigestAlgorithm::Sha512 => {
            pbkdf2::pbkdf2::<Hmac<Sha512>>(password, salt, iterations, output.as_mut_bytes())
        }
    };
    result.map_err(|e| CryptoError::Derivation(format!("PBKDF2 failed: {e}")))?;

    Ok(output)
}
