//! Streaming symmetric encryption and decryption
//!
//! A [`CipherContext`] is created for one direction, fed with `update` and
//! closed with `finalize`. CBC modes buffer at most one block (two when
//! decrypting, to strip padding at the end); the stream modes (CFB, OFB, CTR,
//! RC4) produce output as soon as input arrives.

use std::fmt;

use aes::{Aes128, Aes256};
use cipher::{
    BlockCipher, BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyIvInit, StreamCipher,
    generic_array::GenericArray,
};
use subtle::{ConstantTimeEq, ConstantTimeGreater};
use zeroize::Zeroizing;

use crate::{
    CryptoError,
    ciphers::{CipherAlgorithm, CipherSpec},
    error::Result,
    random,
};

/// Which way a context transforms data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// A block cipher chained one block at a time
trait BlockChain: Send {
    fn process_block(&mut self, block: &mut [u8]);
}

struct CbcEncrypt<C: BlockEncryptMut + BlockCipher>(cbc::Encryptor<C>);

impl<C: BlockEncryptMut + BlockCipher + Send> BlockChain for CbcEncrypt<C> {
    fn process_block(&mut self, block: &mut [u8]) {
        self.0.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

struct CbcDecrypt<C: BlockDecryptMut + BlockCipher>(cbc::Decryptor<C>);

impl<C: BlockDecryptMut + BlockCipher + Send> BlockChain for CbcDecrypt<C> {
    fn process_block(&mut self, block: &mut [u8]) {
        self.0.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

/// A keystream applied in place to data of any length
trait Keystream: Send {
    fn apply(&mut self, data: &mut [u8]);
}

struct StreamMode<S: StreamCipher>(S);

impl<S: StreamCipher + Send> Keystream for StreamMode<S> {
    fn apply(&mut self, data: &mut [u8]) {
        self.0.apply_keystream(data);
    }
}

struct CfbEncrypt<C: BlockEncryptMut + BlockCipher>(cfb_mode::BufEncryptor<C>);

impl<C: BlockEncryptMut + BlockCipher + Send> Keystream for CfbEncrypt<C> {
    fn apply(&mut self, data: &mut [u8]) {
        self.0.encrypt(data);
    }
}

struct CfbDecrypt<C: BlockEncryptMut + BlockCipher>(cfb_mode::BufDecryptor<C>);

impl<C: BlockEncryptMut + BlockCipher + Send> Keystream for CfbDecrypt<C> {
    fn apply(&mut self, data: &mut [u8]) {
        self.0.decrypt(data);
    }
}

enum Engine {
    Padded {
        chain: Box<dyn BlockChain>,
        block_size: usize,
        pending: Zeroizing<Vec<u8>>,
    },
    Stream(Box<dyn Keystream>),
}

fn init_error(spec: &CipherSpec) -> impl FnOnce(InvalidLength) -> CryptoError {
    let name = spec.name();
    move |e| CryptoError::CipherInit(format!("{name} init failed: {e}"))
}

fn cbc_engine<C>(spec: &CipherSpec, key: &[u8], iv: &[u8], direction: Direction) -> Result<Engine>
where
    C: BlockEncryptMut + BlockDecryptMut + BlockCipher + cipher::KeyInit + Send + 'static,
{
    let chain: Box<dyn BlockChain> = match direction {
        Direction::Encrypt => Box::new(CbcEncrypt(
            cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(init_error(spec))?,
        )),
        Direction::Decrypt => Box::new(CbcDecrypt(
            cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(init_error(spec))?,
        )),
    };
    Ok(Engine::Padded {
        chain,
        block_size: spec.block_size(),
        pending: Zeroizing::new(Vec::new()),
    })
}

fn cfb_engine<C>(spec: &CipherSpec, key: &[u8], iv: &[u8], direction: Direction) -> Result<Engine>
where
    C: BlockEncryptMut + BlockCipher + cipher::KeyInit + Send + 'static,
{
    let stream: Box<dyn Keystream> = match direction {
        Direction::Encrypt => Box::new(CfbEncrypt(
            cfb_mode::BufEncryptor::<C>::new_from_slices(key, iv).map_err(init_error(spec))?,
        )),
        Direction::Decrypt => Box::new(CfbDecrypt(
            cfb_mode::BufDecryptor::<C>::new_from_slices(key, iv).map_err(init_error(spec))?,
        )),
    };
    Ok(Engine::Stream(stream))
}

fn stream_engine<S>(spec: &CipherSpec, key: &[u8], iv: &[u8]) -> Result<Engine>
where
    S: KeyIvInit + StreamCipher + Send + 'static,
{
    let cipher = S::new_from_slices(key, iv).map_err(init_error(spec))?;
    Ok(Engine::Stream(Box::new(StreamMode(cipher))))
}

#[cfg(feature = "rc4")]
fn rc4_engine(spec: &CipherSpec, key: &[u8]) -> Result<Engine> {
    use cipher::KeyInit;

    let cipher = rc4::Rc4::<cipher::consts::U16>::new_from_slice(key).map_err(init_error(spec))?;
    Ok(Engine::Stream(Box::new(StreamMode(cipher))))
}

impl Engine {
    fn new(spec: &CipherSpec, key: &[u8], iv: &[u8], direction: Direction) -> Result<Engine> {
        match spec.algorithm() {
            CipherAlgorithm::Aes128Cbc => cbc_engine::<Aes128>(spec, key, iv, direction),
            CipherAlgorithm::Aes256Cbc => cbc_engine::<Aes256>(spec, key, iv, direction),
            CipherAlgorithm::Aes128Cfb => cfb_engine::<Aes128>(spec, key, iv, direction),
            CipherAlgorithm::Aes256Cfb => cfb_engine::<Aes256>(spec, key, iv, direction),
            CipherAlgorithm::Aes128Ofb => stream_engine::<ofb::Ofb<Aes128>>(spec, key, iv),
            CipherAlgorithm::Aes256Ofb => stream_engine::<ofb::Ofb<Aes256>>(spec, key, iv),
            #[cfg(feature = "ctr")]
            CipherAlgorithm::Aes128Ctr => stream_engine::<ctr::Ctr128BE<Aes128>>(spec, key, iv),
            #[cfg(feature = "ctr")]
            CipherAlgorithm::Aes256Ctr => stream_engine::<ctr::Ctr128BE<Aes256>>(spec, key, iv),
            #[cfg(feature = "blowfish")]
            CipherAlgorithm::BlowfishCbc => cbc_engine::<blowfish::Blowfish>(spec, key, iv, direction),
            #[cfg(feature = "blowfish")]
            CipherAlgorithm::BlowfishCfb => cfb_engine::<blowfish::Blowfish>(spec, key, iv, direction),
            #[cfg(feature = "rc4")]
            CipherAlgorithm::Rc4 => rc4_engine(spec, key),
            #[allow(unreachable_patterns)]
            _ => Err(CryptoError::UnknownCipher(format!(
                "{} is not available in this build",
                spec.name()
            ))),
        }
    }
}

/// Single-use streaming cipher state
pub struct CipherContext {
    spec: CipherSpec,
    direction: Direction,
    engine: Option<Engine>,
}

impl CipherContext {
    /// Creates a context, checking key and IV lengths against `spec`
    pub fn new(spec: CipherSpec, key: &[u8], iv: &[u8], direction: Direction) -> Result<Self> {
        if key.len() != spec.key_size() {
            return Err(CryptoError::CipherInit(format!(
                "{} needs a {} byte key, got {}",
                spec.name(),
                spec.key_size(),
                key.len()
            )));
        }
        if iv.len() != spec.iv_size() {
            return Err(CryptoError::CipherInit(format!(
                "{} needs a {} byte IV, got {}",
                spec.name(),
                spec.iv_size(),
                iv.len()
            )));
        }

        Ok(CipherContext {
            spec,
            direction,
            engine: Some(Engine::new(&spec, key, iv, direction)?),
        })
    }

    pub fn encryptor(spec: CipherSpec, key: &[u8], iv: &[u8]) -> Result<Self> {
        CipherContext::new(spec, key, iv, Direction::Encrypt)
    }

    pub fn decryptor(spec: CipherSpec, key: &[u8], iv: &[u8]) -> Result<Self> {
        CipherContext::new(spec, key, iv, Direction::Decrypt)
    }

    pub fn spec(&self) -> &CipherSpec {
        &self.spec
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_finalized(&self) -> bool {
        self.engine.is_none()
    }

    /// Transforms the next chunk of input and returns whatever output is ready
    pub fn update(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let direction = self.direction;
        match self.engine.as_mut().ok_or(CryptoError::ContextReused)? {
            Engine::Stream(keystream) => {
                let mut out = data.to_vec();
                keystream.apply(&mut out);
                Ok(out)
            }
            Engine::Padded {
                chain,
                block_size,
                pending,
            } => {
                pending.extend_from_slice(data);
                let bs = *block_size;
                let mut ready = pending.len() / bs * bs;
                // Hold back the last full block until we know it carries the padding
                if direction == Direction::Decrypt && ready == pending.len() {
                    ready = ready.saturating_sub(bs);
                }

                let mut out: Vec<u8> = pending.drain(..ready).collect();
                for block in out.chunks_exact_mut(bs) {
                    chain.process_block(block);
                }
                Ok(out)
            }
        }
    }

    /// Flushes the remaining output. The context can't be used afterwards.
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        let engine = self.engine.take().ok_or(CryptoError::ContextReused)?;
        match engine {
            Engine::Stream(_) => Ok(Vec::new()),
            Engine::Padded {
                mut chain,
                block_size,
                mut pending,
            } => match self.direction {
                Direction::Encrypt => {
                    let pad = block_size - pending.len();
                    pending.resize(block_size, pad as u8);
                    chain.process_block(&mut pending);
                    Ok(pending.to_vec())
                }
                Direction::Decrypt => {
                    if pending.len() != block_size {
                        return Err(CryptoError::Cipher(format!(
                            "{} ciphertext is not a whole number of blocks",
                            self.spec.name()
                        )));
                    }
                    chain.process_block(&mut pending);
                    let Some(pad) = padding_len(&pending) else {
                        return Err(CryptoError::Cipher(format!(
                            "{} bad decrypt: invalid padding",
                            self.spec.name()
                        )));
                    };
                    Ok(pending[..block_size - pad].to_vec())
                }
            },
        }
    }
}

/// Length of the PKCS#7 padding on a decrypted final block, checked in
/// constant time over the whole block
fn padding_len(block: &[u8]) -> Option<usize> {
    let block_size = block.len();
    let pad = *block.last()?;

    let mut valid = !pad.ct_eq(&0) & !pad.ct_gt(&(block_size as u8));
    for (i, byte) in block.iter().enumerate() {
        let distance = (block_size - i) as u8;
        let in_padding = !distance.ct_gt(&pad);
        valid &= !in_padding | byte.ct_eq(&pad);
    }

    bool::from(valid).then_some(pad as usize)
}

impl fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherContext")
            .field("cipher", &self.spec.name())
            .field("direction", &self.direction)
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

fn run(mut ctx: CipherContext, input: &[u8]) -> Result<Vec<u8>> {
    let mut out = ctx.update(input)?;
    out.extend(ctx.finalize()?);
    Ok(out)
}

/// One-shot encryption
pub fn encrypt(spec: CipherSpec, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    run(CipherContext::encryptor(spec, key, iv)?, plaintext)
}

/// One-shot decryption
pub fn decrypt(spec: CipherSpec, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    run(CipherContext::decryptor(spec, key, iv)?, ciphertext)
}

/// Random IV sized for `spec`
pub fn generate_iv(spec: &CipherSpec) -> Result<Vec<u8>> {
    random::bytes(spec.iv_size())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphers::lookup;

    const KEY16: [u8; 16] = [7u8; 16];
    const IV16: [u8; 16] = [9u8; 16];

    #[test]
    fn wrong_key_length_is_init_error() {
        let spec = lookup("aes-256-cbc").unwrap();
        assert!(matches!(
            CipherContext::encryptor(spec, &KEY16, &IV16),
            Err(CryptoError::CipherInit(_))
        ));
    }

    #[test]
    fn wrong_iv_length_is_init_error() {
        let spec = lookup("aes-128-ofb").unwrap();
        assert!(matches!(
            CipherContext::encryptor(spec, &KEY16, &IV16[..8]),
            Err(CryptoError::CipherInit(_))
        ));
    }

    #[test]
    fn cbc_pads_to_next_block() {
        let spec = lookup("aes-128-cbc").unwrap();
        assert_eq!(encrypt(spec, &KEY16, &IV16, &[]).unwrap().len(), 16);
        assert_eq!(encrypt(spec, &KEY16, &IV16, &[1u8; 15]).unwrap().len(), 16);
        assert_eq!(encrypt(spec, &KEY16, &IV16, &[1u8; 16]).unwrap().len(), 32);
    }

    #[test]
    fn cbc_streaming_matches_one_shot() {
        let spec = lookup("aes-128-cbc").unwrap();
        let data: Vec<u8> = (0..100u8).collect();
        let expected = encrypt(spec, &KEY16, &IV16, &data).unwrap();

        let mut ctx = CipherContext::encryptor(spec, &KEY16, &IV16).unwrap();
        let mut out = Vec::new();
        for chunk in data.chunks(7) {
            out.extend(ctx.update(chunk).unwrap());
        }
        out.extend(ctx.finalize().unwrap());
        assert_eq!(out, expected);

        let mut ctx = CipherContext::decryptor(spec, &KEY16, &IV16).unwrap();
        let mut plain = Vec::new();
        for chunk in expected.chunks(16) {
            plain.extend(ctx.update(chunk).unwrap());
        }
        plain.extend(ctx.finalize().unwrap());
        assert_eq!(plain, data);
    }

    #[test]
    fn cbc_rejects_truncated_ciphertext() {
        let spec = lookup("aes-128-cbc").unwrap();
        let ct = encrypt(spec, &KEY16, &IV16, b"some plaintext here").unwrap();
        assert!(matches!(
            decrypt(spec, &KEY16, &IV16, &ct[..ct.len() - 1]),
            Err(CryptoError::Cipher(_))
        ));
        assert!(matches!(
            decrypt(spec, &KEY16, &IV16, &[]),
            Err(CryptoError::Cipher(_))
        ));
    }

    #[test]
    fn cbc_wrong_key_fails_or_garbles() {
        let spec = lookup("aes-128-cbc").unwrap();
        let ct = encrypt(spec, &KEY16, &IV16, b"attack at dawn").unwrap();
        let result = decrypt(spec, &[8u8; 16], &IV16, &ct);
        assert!(result.is_err() || result.unwrap() != b"attack at dawn");
    }

    #[test]
    fn stream_mode_keeps_length() {
        let spec = lookup("aes-128-cfb").unwrap();
        let ct = encrypt(spec, &KEY16, &IV16, &[0u8; 21]).unwrap();
        assert_eq!(ct.len(), 21);
    }

    #[test]
    fn use_after_finalize_fails() {
        let spec = lookup("aes-128-ofb").unwrap();
        let mut ctx = CipherContext::encryptor(spec, &KEY16, &IV16).unwrap();
        ctx.update(b"data").unwrap();
        ctx.finalize().unwrap();
        assert!(matches!(ctx.update(b"x"), Err(CryptoError::ContextReused)));
        assert!(matches!(ctx.finalize(), Err(CryptoError::ContextReused)));
    }

    #[test]
    fn generated_iv_matches_spec() {
        let spec = lookup("aes-256-cfb").unwrap();
        assert_eq!(generate_iv(&spec).unwrap().len(), 16);
    }

    #[test]
    fn padding_checks_every_padding_byte() {
        let mut block = [0xAAu8; 16];
        block[13..].copy_from_slice(&[3, 3, 3]);
        assert_eq!(padding_len(&block), Some(3));

        // one padding byte disagrees with the length
        block[13] = 2;
        assert_eq!(padding_len(&block), None);

        assert_eq!(padding_len(&[16u8; 16]), Some(16));
        assert_eq!(padding_len(&[8u8; 8]), Some(8));

        let mut zero = [1u8; 16];
        zero[15] = 0;
        assert_eq!(padding_len(&zero), None);
        assert_eq!(padding_len(&[17u8; 16]), None);
        assert_eq!(padding_len(&[]), None);
    }
}
