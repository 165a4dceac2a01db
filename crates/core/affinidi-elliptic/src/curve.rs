//! Named elliptic curve registry
//!
//! Curves are identified by their standard short name and by the numeric
//! identifier OpenSSL assigns them. The registry is immutable and built once.

use std::{collections::HashMap, fmt, sync::LazyLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    CryptoError,
    capability::{self, Capability},
    error::Result,
};

/// Underlying field of a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum FieldType {
    /// GF(p)
    Prime,
    /// GF(2^m)
    Binary,
}

/// A named elliptic curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Curve {
    name: &'static str,
    id: u32,
    field_type: FieldType,
    degree: u16,
}

impl Curve {
    const fn prime(name: &'static str, id: u32, degree: u16) -> Self {
        Curve {
            name,
            id,
            field_type: FieldType::Prime,
            degree,
        }
    }

    const fn binary(name: &'static str, id: u32, degree: u16) -> Self {
        Curve {
            name,
            id,
            field_type: FieldType::Binary,
            degree,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Numeric identifier (OpenSSL NID)
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Field size in bits
    pub fn degree(&self) -> u16 {
        self.degree
    }

    /// Width in bytes of a field element or scalar: ceil(degree / 8)
    pub fn field_size(&self) -> usize {
        (self.degree as usize).div_ceil(8)
    }

    /// Capability that provides group arithmetic for this curve, if any exists
    pub fn capability(&self) -> Option<Capability> {
        match self.id {
            PRIME256V1 => Some(Capability::P256),
            SECP256K1 => Some(Capability::Secp256k1),
            SECP384R1 => Some(Capability::P384),
            SECP521R1 => Some(Capability::P521),
            SECP224R1 => Some(Capability::P224),
            _ => None,
        }
    }

    /// Can keys be generated and used on this curve in this build?
    pub fn has_arithmetic(&self) -> bool {
        self.capability().is_some_and(capability::supports)
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl TryFrom<&str> for Curve {
    type Error = CryptoError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        lookup_by_name(value)
    }
}

impl Serialize for Curve {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

impl<'de> Deserialize<'de> for Curve {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        lookup_by_name(&name).map_err(serde::de::Error::custom)
    }
}

// ****************************************************************************
// Curve identifiers (OpenSSL NIDs)
// ****************************************************************************
pub const SECP112R1: u32 = 704;
pub const SECP112R2: u32 = 705;
pub const SECP128R1: u32 = 706;
pub const SECP128R2: u32 = 707;
pub const SECP160K1: u32 = 708;
pub const SECP160R1: u32 = 709;
pub const SECP160R2: u32 = 710;
pub const SECP192K1: u32 = 711;
pub const SECP224K1: u32 = 712;
pub const SECP224R1: u32 = 713;
pub const SECP256K1: u32 = 714;
pub const SECP384R1: u32 = 715;
pub const SECP521R1: u32 = 716;
pub const SECT113R1: u32 = 717;
pub const SECT113R2: u32 = 718;
pub const SECT131R1: u32 = 719;
pub const SECT131R2: u32 = 720;
pub const SECT163K1: u32 = 721;
pub const SECT163R1: u32 = 722;
pub const SECT163R2: u32 = 723;
pub const SECT193R1: u32 = 724;
pub const SECT193R2: u32 = 725;
pub const SECT233K1: u32 = 726;
pub const SECT233R1: u32 = 727;
pub const SECT239K1: u32 = 728;
pub const SECT283K1: u32 = 729;
pub const SECT283R1: u32 = 730;
pub const SECT409K1: u32 = 731;
pub const SECT409R1: u32 = 732;
pub const SECT571K1: u32 = 733;
pub const SECT571R1: u32 = 734;
pub const PRIME256V1: u32 = 415;

/// Every named curve, in registration order
const CURVES: [Curve; 32] = [
    Curve::prime("secp112r1", SECP112R1, 112),
    Curve::prime("secp112r2", SECP112R2, 112),
    Curve::prime("secp128r1", SECP128R1, 128),
    Curve::prime("secp128r2", SECP128R2, 128),
    Curve::prime("secp160k1", SECP160K1, 160),
    Curve::prime("secp160r1", SECP160R1, 160),
    Curve::prime("secp160r2", SECP160R2, 160),
    Curve::prime("secp192k1", SECP192K1, 192),
    Curve::prime("secp224k1", SECP224K1, 224),
    Curve::prime("secp224r1", SECP224R1, 224),
    Curve::prime("secp256k1", SECP256K1, 256),
    Curve::prime("secp384r1", SECP384R1, 384),
    Curve::prime("secp521r1", SECP521R1, 521),
    Curve::binary("sect113r1", SECT113R1, 113),
    Curve::binary("sect113r2", SECT113R2, 113),
    Curve::binary("sect131r1", SECT131R1, 131),
    Curve::binary("sect131r2", SECT131R2, 131),
    Curve::binary("sect163k1", SECT163K1, 163),
    Curve::binary("sect163r1", SECT163R1, 163),
    Curve::binary("sect163r2", SECT163R2, 163),
    Curve::binary("sect193r1", SECT193R1, 193),
    Curve::binary("sect193r2", SECT193R2, 193),
    Curve::binary("sect233k1", SECT233K1, 233),
    Curve::binary("sect233r1", SECT233R1, 233),
    Curve::binary("sect239k1", SECT239K1, 239),
    Curve::binary("sect283k1", SECT283K1, 283),
    Curve::binary("sect283r1", SECT283R1, 283),
    Curve::binary("sect409k1", SECT409K1, 409),
    Curve::binary("sect409r1", SECT409R1, 409),
    Curve::binary("sect571k1", SECT571K1, 571),
    Curve::binary("sect571r1", SECT571R1, 571),
    Curve::prime("prime256v1", PRIME256V1, 256),
];

struct CurveRegistry {
    by_name: HashMap<&'static str, Curve>,
    by_id: HashMap<u32, Curve>,
}

impl CurveRegistry {
    fn build() -> Self {
        let mut by_name = HashMap::with_capacity(CURVES.len());
        let mut by_id = HashMap::with_capacity(CURVES.len());

        for curve in CURVES {
            by_name.insert(curve.name, curve);
            // Reverse lookup keeps the first registration for an identifier
            if let Some(existing) = by_id.get(&curve.id) {
                warn!(
                    "Curve id ({}) is shared by {} and {}, reverse lookup resolves to {}",
                    curve.id, existing, curve, existing
                );
            } else {
                by_id.insert(curve.id, curve);
            }
        }

        debug!("Curve registry built with {} curves", by_name.len());
        CurveRegistry { by_name, by_id }
    }
}

static REGISTRY: LazyLock<CurveRegistry> = LazyLock::new(CurveRegistry::build);

/// Finds a curve by its standard name (e.g. `secp256k1`)
pub fn lookup_by_name(name: &str) -> Result<Curve> {
    REGISTRY
        .by_name
        .get(name)
        .copied()
        .ok_or_else(|| CryptoError::UnknownCurve(name.to_string()))
}

/// Finds a curve by its numeric identifier
pub fn lookup_by_id(id: u32) -> Result<Curve> {
    REGISTRY
        .by_id
        .get(&id)
        .copied()
        .ok_or_else(|| CryptoError::UnknownCurve(format!("id {id}")))
}

/// All named curves in registration order
pub fn curves() -> impl Iterator<Item = Curve> {
    CURVES.into_iter()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn lookup_known_curves() {
        let curve = lookup_by_name("secp256k1").unwrap();
        assert_eq!(curve.id(), 714);
        assert_eq!(curve.field_size(), 32);

        let curve = lookup_by_id(415).unwrap();
        assert_eq!(curve.name(), "prime256v1");
        assert_eq!(curve.field_type(), FieldType::Prime);
    }

    #[test]
    fn unknown_curve_is_an_error() {
        assert!(matches!(
            lookup_by_name("nonexistent-curve"),
            Err(CryptoError::UnknownCurve(_))
        ));
        assert!(matches!(lookup_by_id(1), Err(CryptoError::UnknownCurve(_))));
    }

    #[test]
    fn identifiers_and_names_are_unique() {
        let ids: HashSet<u32> = curves().map(|c| c.id()).collect();
        let names: HashSet<&str> = curves().map(|c| c.name()).collect();
        assert_eq!(ids.len(), 32);
        assert_eq!(names.len(), 32);
    }

    #[test]
    fn name_and_id_lookups_agree() {
        for curve in curves() {
            assert_eq!(lookup_by_id(curve.id()).unwrap(), curve);
            assert_eq!(lookup_by_name(curve.name()).unwrap(), curve);
        }
    }

    #[test]
    fn field_sizes_round_up() {
        assert_eq!(lookup_by_name("secp521r1").unwrap().field_size(), 66);
        assert_eq!(lookup_by_name("sect113r1").unwrap().field_size(), 15);
        assert_eq!(lookup_by_name("secp384r1").unwrap().field_size(), 48);
    }

    #[test]
    fn binary_curves_have_no_arithmetic() {
        let curve = lookup_by_name("sect283r1").unwrap();
        assert_eq!(curve.field_type(), FieldType::Binary);
        assert!(curve.capability().is_none());
        assert!(!curve.has_arithmetic());
    }

    #[test]
    fn serde_uses_curve_name() {
        let curve = lookup_by_name("secp384r1").unwrap();
        let json = serde_json::to_string(&curve).unwrap();
        assert_eq!(json, "\"secp384r1\"");
        let back: Curve = serde_json::from_str(&json).unwrap();
        assert_eq!(back, curve);
        assert!(serde_json::from_str::<Curve>("\"nope\"").is_err());
    }
}
