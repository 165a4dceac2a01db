//! Access to the operating system CSPRNG
//!
//! Every random byte used by this crate comes through here so that a failing
//! entropy source surfaces as [`CryptoError::Entropy`] instead of a panic.

use rand::{SeedableRng, rngs::StdRng};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroize;

use crate::{CryptoError, error::Result};

/// Fills `buf` with bytes from the OS random source
pub fn fill(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::Entropy(format!("OS random source failed: {e}")))
}

/// Returns `len` random bytes
pub fn bytes(len: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; len];
    fill(&mut out)?;
    Ok(out)
}

/// A CSPRNG seeded from the OS random source.
/// For APIs that draw from an infallible `RngCore`.
pub(crate) fn seeded_rng() -> Result<StdRng> {
    let mut seed = [0u8; 32];
    fill(&mut seed)?;
    let rng = StdRng::from_seed(seed);
    seed.zeroize();
    Ok(rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_have_requested_length() {
        assert_eq!(bytes(0).unwrap().len(), 0);
        assert_eq!(bytes(48).unwrap().len(), 48);
    }

    #[test]
    fn consecutive_draws_differ() {
        assert_ne!(bytes(32).unwrap(), bytes(32).unwrap());
    }
}
