//! Elliptic curve key pairs
//!
//! A [`KeyPair`] always holds a validated public point and may hold the
//! matching private scalar. Public-only key pairs are used for verification
//! and as ECDH peers. The private scalar lives in a [`SecretBuffer`] and is
//! zeroized when the key pair is dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    CryptoError, SecretBuffer,
    arithmetic::{self, CurveOps},
    curve::Curve,
    error::Result,
    random,
};

/// SEC1 tag of an uncompressed point
pub const UNCOMPRESSED_TAG: u8 = 0x04;

/// Rejection sampling attempts before key generation gives up
const MAX_GENERATION_ATTEMPTS: usize = 64;

/// Serialization of a public point
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointFormat {
    /// `0x04 || X || Y`
    #[default]
    Uncompressed,
    /// `0x02 / 0x03 || X`
    Compressed,
}

/// Affine coordinates of a public point, big-endian and field width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPoint {
    pub x: Vec<u8>,
    pub y: Vec<u8>,
}

impl PublicPoint {
    /// Splits an uncompressed SEC1 encoding into its coordinates
    fn from_uncompressed(encoded: &[u8], field_size: usize) -> Result<Self> {
        if encoded.len() != 1 + 2 * field_size || encoded[0] != UNCOMPRESSED_TAG {
            return Err(CryptoError::InvalidEncoding(
                "Expected an uncompressed SEC1 point".into(),
            ));
        }
        Ok(PublicPoint {
            x: encoded[1..1 + field_size].to_vec(),
            y: encoded[1 + field_size..].to_vec(),
        })
    }

    /// Encodes the point in the requested SEC1 format
    pub fn encode(&self, format: PointFormat) -> Vec<u8> {
        match format {
            PointFormat::Uncompressed => {
                let mut out = Vec::with_capacity(1 + self.x.len() + self.y.len());
                out.push(UNCOMPRESSED_TAG);
                out.extend_from_slice(&self.x);
                out.extend_from_slice(&self.y);
                out
            }
            PointFormat::Compressed => {
                let odd = self.y.last().is_some_and(|b| b & 1 == 1);
                let mut out = Vec::with_capacity(1 + self.x.len());
                out.push(if odd { 0x03 } else { 0x02 });
                out.extend_from_slice(&self.x);
                out
            }
        }
    }
}

/// An elliptic curve key pair, optionally without its private scalar
pub struct KeyPair {
    curve: Curve,
    private: Option<SecretBuffer>,
    public: PublicPoint,
}

impl KeyPair {
    /// Generates a random key pair on `curve`
    pub fn generate(curve: &Curve) -> Result<KeyPair> {
        let ops = arithmetic::require(curve)?;
        let field_size = curve.field_size();
        // Bits above the degree are masked so most draws land below the order
        let excess_bits = field_size * 8 - curve.degree() as usize;

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let mut scalar = SecretBuffer::new(field_size);
            random::fill(scalar.as_mut_bytes())?;
            scalar.as_mut_bytes()[0] &= 0xff >> excess_bits;

            if !ops.is_valid_scalar(scalar.as_bytes()) {
                debug!("{curve}: scalar out of range on attempt {attempt}, retrying");
                continue;
            }

            let encoded = ops.public_point(scalar.as_bytes()).map_err(|e| {
                CryptoError::KeyGeneration(format!("{curve} public point derivation failed: {e}"))
            })?;
            let keypair = KeyPair {
                curve: *curve,
                private: Some(scalar),
                public: PublicPoint::from_uncompressed(&encoded, field_size)?,
            };

            if !keypair.validate() {
                warn!("{curve}: generated key pair failed self validation");
                return Err(CryptoError::KeyGeneration(format!(
                    "{curve} generated key pair failed validation"
                )));
            }
            return Ok(keypair);
        }

        Err(CryptoError::KeyGeneration(format!(
            "{curve}: no valid scalar after {MAX_GENERATION_ATTEMPTS} attempts"
        )))
    }

    /// Imports a big-endian private scalar of exactly `curve.field_size()` bytes
    pub fn import_private(curve: &Curve, bytes: &[u8]) -> Result<KeyPair> {
        let ops = arithmetic::require(curve)?;
        let field_size = curve.field_size();
        if bytes.len() != field_size {
            return Err(CryptoError::InvalidEncoding(format!(
                "{curve} private scalar must be {field_size} bytes, got {}",
                bytes.len()
            )));
        }

        let encoded = ops.public_point(bytes)?;
        Ok(KeyPair {
            curve: *curve,
            private: Some(SecretBuffer::from_slice(bytes)),
            public: PublicPoint::from_uncompressed(&encoded, field_size)?,
        })
    }

    /// Imports a SEC1 public point (compressed or uncompressed).
    /// The point must lie on `curve`.
    pub fn import_public(curve: &Curve, bytes: &[u8]) -> Result<KeyPair> {
        let ops = arithmetic::require(curve)?;
        let encoded = ops.decode_point(bytes)?;
        Ok(KeyPair {
            curve: *curve,
            private: None,
            public: PublicPoint::from_uncompressed(&encoded, curve.field_size())?,
        })
    }

    /// Builds a key pair from raw coordinates and an optional private scalar,
    /// checking that they are consistent
    pub fn from_components(
        curve: &Curve,
        private: Option<&[u8]>,
        x: &[u8],
        y: &[u8],
    ) -> Result<KeyPair> {
        arithmetic::require(curve)?;
        let field_size = curve.field_size();
        if x.len() != field_size || y.len() != field_size {
            return Err(CryptoError::InvalidEncoding(format!(
                "{curve} coordinates must be {field_size} bytes"
            )));
        }
        if let Some(private) = private
            && private.len() != field_size
        {
            return Err(CryptoError::InvalidEncoding(format!(
                "{curve} private scalar must be {field_size} bytes, got {}",
                private.len()
            )));
        }

        let keypair = KeyPair {
            curve: *curve,
            private: private.map(SecretBuffer::from_slice),
            public: PublicPoint {
                x: x.to_vec(),
                y: y.to_vec(),
            },
        };
        if !keypair.validate() {
            return Err(CryptoError::InvalidEncoding(format!(
                "{curve} key components are not a valid key pair"
            )));
        }
        Ok(keypair)
    }

    /// Checks the public point is on the curve and, when a private scalar is
    /// present, that `scalar * G` equals the public point
    pub fn validate(&self) -> bool {
        let Some(ops) = arithmetic::backend(&self.curve) else {
            return false;
        };
        let encoded = self.public.encode(PointFormat::Uncompressed);
        let Ok(decoded) = ops.decode_point(&encoded) else {
            return false;
        };
        if decoded != encoded {
            return false;
        }

        match &self.private {
            Some(scalar) => ops
                .public_point(scalar.as_bytes())
                .is_ok_and(|derived| derived == encoded),
            None => true,
        }
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn public_point(&self) -> &PublicPoint {
        &self.public
    }

    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    /// The raw private scalar, if present
    pub fn private_bytes(&self) -> Option<&SecretBuffer> {
        self.private.as_ref()
    }

    /// Uncompressed SEC1 public point: `0x04 || X || Y`
    pub fn export_public(&self) -> Vec<u8> {
        self.public.encode(PointFormat::Uncompressed)
    }

    pub fn export_public_with(&self, format: PointFormat) -> Vec<u8> {
        self.public.encode(format)
    }

    /// A copy of this key pair without the private scalar
    pub fn to_public(&self) -> KeyPair {
        KeyPair {
            curve: self.curve,
            private: None,
            public: self.public.clone(),
        }
    }

    pub(crate) fn ops(&self) -> Result<&'static dyn CurveOps> {
        arithmetic::require(&self.curve)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("curve", &self.curve.name())
            .field("public", &self.public)
            .field("private", &self.private.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
