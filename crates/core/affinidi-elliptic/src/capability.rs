//! Build dependent capabilities
//!
//! Which curves carry group arithmetic and which cipher families are compiled
//! in is decided by cargo features. The set is resolved once, on first use, and
//! queried through [`supports`] rather than by branching at call sites.

use std::{collections::HashSet, fmt, sync::LazyLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Optional functionality that may be absent from a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Capability {
    /// prime256v1 (NIST P-256) group arithmetic
    P256,
    /// secp256k1 group arithmetic
    Secp256k1,
    /// secp384r1 (NIST P-384) group arithmetic
    P384,
    /// secp521r1 (NIST P-521) group arithmetic
    P521,
    /// secp224r1 (NIST P-224) group arithmetic
    P224,
    /// AES in counter mode
    CounterMode,
    /// Blowfish CBC and CFB64
    Blowfish,
    /// RC4 stream cipher
    Rc4,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::P256,
        Capability::Secp256k1,
        Capability::P384,
        Capability::P521,
        Capability::P224,
        Capability::CounterMode,
        Capability::Blowfish,
        Capability::Rc4,
    ];

    fn compiled_in(self) -> bool {
        match self {
            Capability::P256 => cfg!(feature = "p256"),
            Capability::Secp256k1 => cfg!(feature = "k256"),
            Capability::P384 => cfg!(feature = "p384"),
            Capability::P521 => cfg!(feature = "p521"),
            Capability::P224 => cfg!(feature = "p224"),
            Capability::CounterMode => cfg!(feature = "ctr"),
            Capability::Blowfish => cfg!(feature = "blowfish"),
            Capability::Rc4 => cfg!(feature = "rc4"),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Capability::P256 => write!(f, "prime256v1"),
            Capability::Secp256k1 => write!(f, "secp256k1"),
            Capability::P384 => write!(f, "secp384r1"),
            Capability::P521 => write!(f, "secp521r1"),
            Capability::P224 => write!(f, "secp224r1"),
            Capability::CounterMode => write!(f, "aes-ctr"),
            Capability::Blowfish => write!(f, "blowfish"),
            Capability::Rc4 => write!(f, "rc4"),
        }
    }
}

/// The resolved capability set of this build
#[derive(Debug, Clone)]
pub struct Capabilities {
    enabled: HashSet<Capability>,
}

impl Capabilities {
    fn detect() -> Self {
        let enabled: HashSet<Capability> = Capability::ALL
            .into_iter()
            .filter(|c| c.compiled_in())
            .collect();
        debug!("Resolved {} of {} capabilities", enabled.len(), Capability::ALL.len());
        Capabilities { enabled }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    /// Iterates the enabled capabilities
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL
            .into_iter()
            .filter(|c| self.enabled.contains(c))
    }
}

static CAPABILITIES: LazyLock<Capabilities> = LazyLock::new(Capabilities::detect);

/// Returns the process wide capability set
pub fn capabilities() -> &'static Capabilities {
    &CAPABILITIES
}

/// Does this build provide `capability`?
pub fn supports(capability: Capability) -> bool {
    CAPABILITIES.supports(capability)
}
