//! Error types for cryptographic operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Unknown curve: {0}")]
    UnknownCurve(String),

    #[error("Curve ({0}) has no group arithmetic in this build")]
    UnsupportedCurve(String),

    #[error("Unknown cipher: {0}")]
    UnknownCipher(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    #[error("ECDH error: {0}")]
    Ecdh(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),

    #[error("Cipher init error: {0}")]
    CipherInit(String),

    #[error("Cipher error: {0}")]
    Cipher(String),

    #[error("Key derivation error: {0}")]
    Derivation(String),

    #[error("Context has already been finalized")]
    ContextReused,

    #[error("Entropy error: {0}")]
    Entropy(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
