//! Elliptic curve Diffie-Hellman
//!
//! The shared secret is the raw X coordinate of `d_local * Q_peer`. It is not
//! uniformly random: run it through a KDF or at least a digest before using
//! it as key material.

use tracing::debug;
use zeroize::Zeroizing;

use crate::{CryptoError, error::Result, key::KeyPair};

/// Raw ECDH output, zeroized on drop. Deliberately neither `Clone` nor `Debug`.
pub struct SharedSecret(Zeroizing<Vec<u8>>);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SharedSecret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Computes the shared secret between `local` (which must hold a private
/// scalar) and `peer`. Both keys must be on the same curve.
pub fn compute_shared_secret(local: &KeyPair, peer: &KeyPair) -> Result<SharedSecret> {
    if local.curve() != peer.curve() {
        return Err(CryptoError::Ecdh(format!(
            "Curve mismatch: local key is {}, peer key is {}",
            local.curve(),
            peer.curve()
        )));
    }
    compute_shared_secret_with_point(local, &peer.export_public())
}

/// As [`compute_shared_secret`] with the peer given as a SEC1 encoded point
/// on the local key's curve
pub fn compute_shared_secret_with_point(local: &KeyPair, peer: &[u8]) -> Result<SharedSecret> {
    let Some(scalar) = local.private_bytes() else {
        return Err(CryptoError::Ecdh(
            "Local key has no private scalar".into(),
        ));
    };
    let ops = local.ops().map_err(|e| CryptoError::Ecdh(e.to_string()))?;

    let secret = ops.diffie_hellman(scalar.as_bytes(), peer)?;
    debug!("{}: derived {} byte shared secret", local.curve(), secret.len());
    Ok(SharedSecret(secret))
}
