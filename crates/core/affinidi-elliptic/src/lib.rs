//! Elliptic curve, digest and symmetric cipher primitives for Affinidi TDK
//!
//! This crate provides:
//! - A registry of named curves, addressable by name or numeric identifier
//! - Key generation, import, export and validation ([`KeyPair`])
//! - ECDH shared secrets and ECDSA over caller supplied digests
//! - SHA-2 digests, HMAC and PBKDF2
//! - A registry of symmetric ciphers with streaming encrypt/decrypt contexts
//! - Zeroizing buffers for secret material
//!
//! Which curves and cipher families are usable depends on the enabled cargo
//! features; see [`capability`].

mod arithmetic;
mod error;

pub mod buffer;
pub mod capability;
pub mod ciphers;
pub mod config;
pub mod curve;
pub mod digest;
pub mod ecc;
pub mod ecdh;
pub mod ecdsa;
pub mod hmac;
pub mod kdf;
pub mod key;
pub mod random;
pub mod symmetric;

pub use buffer::{FixedBuffer, SecretBuffer};
pub use capability::Capability;
pub use ciphers::CipherSpec;
pub use config::{EccConfig, SigningMode};
pub use curve::Curve;
pub use digest::{DigestAlgorithm, DigestContext};
pub use ecc::Ecc;
pub use ecdh::SharedSecret;
pub use error::{CryptoError, Result};
pub use key::{KeyPair, PointFormat, PublicPoint};
pub use symmetric::{CipherContext, Direction};
