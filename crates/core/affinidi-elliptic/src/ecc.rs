//! High level key holder
//!
//! [`Ecc`] bundles a [`KeyPair`] with an [`EccConfig`] so callers can sign
//! messages (not digests), verify and agree on shared secrets without wiring
//! the lower level modules together themselves.

use tracing::debug;

use crate::{
    CryptoError,
    config::{EccConfig, SigningMode},
    curve::Curve,
    digest::digest,
    ecdh::{self, SharedSecret},
    ecdsa,
    error::Result,
    key::KeyPair,
};

#[derive(Debug)]
pub struct Ecc {
    config: EccConfig,
    keypair: KeyPair,
}

impl Ecc {
    /// Generates a fresh key pair on the configured curve
    pub fn new(config: EccConfig) -> Result<Ecc> {
        let keypair = KeyPair::generate(&config.curve)?;
        debug!("Ecc: generated {} key pair", config.curve);
        Ok(Ecc { config, keypair })
    }

    /// Wraps an existing key pair, which must be on the configured curve
    pub fn from_keypair(config: EccConfig, keypair: KeyPair) -> Result<Ecc> {
        if keypair.curve() != config.curve {
            return Err(CryptoError::Config(format!(
                "Key pair is on {}, configuration expects {}",
                keypair.curve(),
                config.curve
            )));
        }
        Ok(Ecc { config, keypair })
    }

    pub fn curve(&self) -> Curve {
        self.config.curve
    }

    pub fn config(&self) -> &EccConfig {
        &self.config
    }

    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    /// Public point in the configured format
    pub fn public_key(&self) -> Vec<u8> {
        self.keypair.export_public_with(self.config.point_format)
    }

    /// Hashes `message` with the configured digest and signs it
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let hash = digest(self.config.digest, message);
        match self.config.signing {
            SigningMode::Deterministic => ecdsa::sign(&hash, &self.keypair),
            SigningMode::Randomized => ecdsa::sign_randomized(&hash, &self.keypair),
        }
    }

    /// Verifies a signature produced by [`Ecc::sign`] over `message`
    pub fn verify(&self, signature: &[u8], message: &[u8]) -> Result<bool> {
        let hash = digest(self.config.digest, message);
        ecdsa::verify(&hash, signature, &self.keypair)
    }

    /// Raw ECDH secret with `peer`, given as a SEC1 encoded point
    pub fn shared_secret(&self, peer: &[u8]) -> Result<SharedSecret> {
        let peer = KeyPair::import_public(&self.config.curve, peer)
            .map_err(|e| CryptoError::Ecdh(format!("Peer key rejected: {e}")))?;
        ecdh::compute_shared_secret(&self.keypair, &peer)
    }
}
