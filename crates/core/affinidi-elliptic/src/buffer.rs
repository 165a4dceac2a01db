//! Owned buffers for secret material
//!
//! Buffers are exclusively owned, length tracked and zeroized when dropped.
//! Neither type implements `Clone`; pass them by reference to operations.

use std::fmt;

use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, error::Result, random};

/// Variable length secret buffer
#[derive(Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretBuffer {
    bytes: Vec<u8>,
}

impl SecretBuffer {
    /// Allocates a zero-filled buffer of `len` bytes
    pub fn new(len: usize) -> Self {
        SecretBuffer {
            bytes: vec![0u8; len],
        }
    }

    /// Allocates a buffer of exactly `size` bytes holding `data` at the start.
    /// The remainder is zero-filled. Fails if `data` does not fit.
    pub fn with_capacity_from(data: &[u8], size: usize) -> Result<Self> {
        if data.len() > size {
            return Err(CryptoError::InvalidEncoding(format!(
                "{} bytes of data don't fit a {size} byte buffer",
                data.len()
            )));
        }
        let mut buffer = SecretBuffer::new(size);
        buffer.bytes[..data.len()].copy_from_slice(data);
        Ok(buffer)
    }

    /// Copies `data` into a new buffer of the same length
    pub fn from_slice(data: &[u8]) -> Self {
        SecretBuffer {
            bytes: data.to_vec(),
        }
    }

    /// Allocates a buffer of `len` bytes filled from the OS random source
    pub fn random(len: usize) -> Result<Self> {
        let mut buffer = SecretBuffer::new(len);
        random::fill(&mut buffer.bytes)?;
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl From<Vec<u8>> for SecretBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        SecretBuffer { bytes }
    }
}

impl AsRef<[u8]> for SecretBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl ConstantTimeEq for SecretBuffer {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.bytes.as_slice().ct_eq(other.bytes.as_slice())
    }
}

impl PartialEq for SecretBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for SecretBuffer {}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBuffer")
            .field("length", &self.bytes.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Fixed length secret buffer, for IVs, seeds and other sized material
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct FixedBuffer<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedBuffer<N> {
    pub fn new(bytes: [u8; N]) -> Self {
        FixedBuffer { bytes }
    }

    /// Copies a slice into the buffer, failing unless it is exactly `N` bytes
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let bytes: [u8; N] = data.try_into().map_err(|_| {
            CryptoError::InvalidEncoding(format!("expected {N} bytes, got {}", data.len()))
        })?;
        Ok(FixedBuffer { bytes })
    }

    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; N];
        random::fill(&mut bytes)?;
        Ok(FixedBuffer { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }
}

impl<const N: usize> fmt::Debug for FixedBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBuffer")
            .field("length", &N)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_zero_filled() {
        let buffer = SecretBuffer::new(16);
        assert_eq!(buffer.len(), 16);
        assert!(buffer.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn with_capacity_pads_and_rejects_overflow() {
        let buffer = SecretBuffer::with_capacity_from(b"abc", 5).unwrap();
        assert_eq!(buffer.as_bytes(), b"abc\0\0");

        assert!(matches!(
            SecretBuffer::with_capacity_from(b"abcdef", 5),
            Err(CryptoError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn zeroize_clears_contents() {
        let mut buffer = SecretBuffer::from_slice(&[0xAB; 8]);
        buffer.zeroize();
        assert!(buffer.is_empty());
    }

    #[test]
    fn debug_is_redacted() {
        let buffer = SecretBuffer::from_slice(&[0xAB; 4]);
        let debug = format!("{buffer:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("171"));

        let fixed = FixedBuffer::new([0xABu8; 4]);
        assert!(format!("{fixed:?}").contains("[REDACTED]"));
    }

    #[test]
    fn equality_compares_contents() {
        assert_eq!(SecretBuffer::from_slice(b"key"), SecretBuffer::from_slice(b"key"));
        assert_ne!(SecretBuffer::from_slice(b"key"), SecretBuffer::from_slice(b"kez"));
        assert_ne!(SecretBuffer::from_slice(b"key"), SecretBuffer::from_slice(b"keys"));
    }

    #[test]
    fn fixed_from_slice_checks_length() {
        assert!(FixedBuffer::<4>::from_slice(&[1, 2, 3, 4]).is_ok());
        assert!(FixedBuffer::<4>::from_slice(&[1, 2, 3]).is_err());
    }

    #[test]
    fn random_buffers_differ() {
        let a = SecretBuffer::random(32).unwrap();
        let b = SecretBuffer::random(32).unwrap();
        assert_ne!(a, b);
        assert_ne!(FixedBuffer::<16>::random().unwrap().as_bytes(), &[0u8; 16]);
    }
}
