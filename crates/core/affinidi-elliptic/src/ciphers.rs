//! Symmetric cipher registry
//!
//! Ciphers are named the way OpenSSL names them (`aes-256-cbc`, `aes-128-ctr`,
//! ...). Counter mode, Blowfish and RC4 are optional cargo features; a cipher
//! that isn't compiled in is reported by [`is_available`] and rejected by
//! [`lookup`] with [`CryptoError::UnknownCipher`].
//!
//! `rc4` is a stream cipher. Its `block_size` of 128 is a legacy value (the
//! historical initialisation size), not a block boundary. Use
//! [`CipherSpec::iv_size`] to size IVs.

use std::{collections::HashMap, fmt, sync::LazyLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    CryptoError,
    capability::{self, Capability},
    error::Result,
};

/// Selects the cipher implementation behind a [`CipherSpec`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum CipherAlgorithm {
    Aes128Cbc,
    Aes256Cbc,
    Aes128Cfb,
    Aes256Cfb,
    Aes128Ofb,
    Aes256Ofb,
    Aes128Ctr,
    Aes256Ctr,
    BlowfishCbc,
    BlowfishCfb,
    Rc4,
}

impl CipherAlgorithm {
    /// Capability a build needs for this algorithm, if it is optional
    pub fn capability(&self) -> Option<Capability> {
        match self {
            CipherAlgorithm::Aes128Ctr | CipherAlgorithm::Aes256Ctr => {
                Some(Capability::CounterMode)
            }
            CipherAlgorithm::BlowfishCbc | CipherAlgorithm::BlowfishCfb => {
                Some(Capability::Blowfish)
            }
            CipherAlgorithm::Rc4 => Some(Capability::Rc4),
            _ => None,
        }
    }

    /// Does the mode apply PKCS#7 padding?
    pub fn is_padded(&self) -> bool {
        matches!(
            self,
            CipherAlgorithm::Aes128Cbc | CipherAlgorithm::Aes256Cbc | CipherAlgorithm::BlowfishCbc
        )
    }
}

/// Parameters of a named symmetric cipher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSpec {
    name: &'static str,
    block_size: usize,
    key_size: usize,
    iv_size: usize,
    algorithm: CipherAlgorithm,
}

impl CipherSpec {
    const fn new(
        name: &'static str,
        block_size: usize,
        key_size: usize,
        iv_size: usize,
        algorithm: CipherAlgorithm,
    ) -> Self {
        CipherSpec {
            name,
            block_size,
            key_size,
            iv_size,
            algorithm,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Block size in bytes. Nominal for `rc4`, see the module docs.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn key_size(&self) -> usize {
        self.key_size
    }

    pub fn iv_size(&self) -> usize {
        self.iv_size
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    fn is_compiled_in(&self) -> bool {
        self.algorithm
            .capability()
            .is_none_or(capability::supports)
    }
}

impl fmt::Display for CipherSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Cipher : {} | Blocksize : {} | Algorithm : {:?}",
            self.name, self.block_size, self.algorithm
        )
    }
}

const CIPHERS: [CipherSpec; 11] = [
    CipherSpec::new("aes-128-cbc", 16, 16, 16, CipherAlgorithm::Aes128Cbc),
    CipherSpec::new("aes-256-cbc", 16, 32, 16, CipherAlgorithm::Aes256Cbc),
    CipherSpec::new("aes-128-cfb", 16, 16, 16, CipherAlgorithm::Aes128Cfb),
    CipherSpec::new("aes-256-cfb", 16, 32, 16, CipherAlgorithm::Aes256Cfb),
    CipherSpec::new("aes-128-ofb", 16, 16, 16, CipherAlgorithm::Aes128Ofb),
    CipherSpec::new("aes-256-ofb", 16, 32, 16, CipherAlgorithm::Aes256Ofb),
    CipherSpec::new("bf-cfb", 8, 16, 8, CipherAlgorithm::BlowfishCfb),
    CipherSpec::new("bf-cbc", 8, 16, 8, CipherAlgorithm::BlowfishCbc),
    // 128 is the initialisation size, not a block size
    CipherSpec::new("rc4", 128, 16, 0, CipherAlgorithm::Rc4),
    CipherSpec::new("aes-128-ctr", 16, 16, 16, CipherAlgorithm::Aes128Ctr),
    CipherSpec::new("aes-256-ctr", 16, 32, 16, CipherAlgorithm::Aes256Ctr),
];

static REGISTRY: LazyLock<HashMap<&'static str, CipherSpec>> = LazyLock::new(|| {
    let registry: HashMap<&'static str, CipherSpec> = CIPHERS
        .into_iter()
        .filter(CipherSpec::is_compiled_in)
        .map(|spec| (spec.name, spec))
        .collect();
    debug!(
        "Cipher registry built with {} of {} ciphers",
        registry.len(),
        CIPHERS.len()
    );
    registry
});

/// Finds an available cipher by name
pub fn lookup(name: &str) -> Result<CipherSpec> {
    REGISTRY.get(name).copied().ok_or_else(|| {
        if CIPHERS.iter().any(|spec| spec.name == name) {
            CryptoError::UnknownCipher(format!("{name} is not available in this build"))
        } else {
            CryptoError::UnknownCipher(name.to_string())
        }
    })
}

/// Is `name` a cipher this build can use?
pub fn is_available(name: &str) -> bool {
    REGISTRY.contains_key(name)
}

/// Available ciphers, in registration order
pub fn available() -> impl Iterator<Item = CipherSpec> {
    CIPHERS.into_iter().filter(CipherSpec::is_compiled_in)
}
