/*!
 * Run-time configuration for the [`crate::ecc::Ecc`] facade
 */

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    CryptoError,
    curve::{self, Curve, lookup_by_name},
    digest::DigestAlgorithm,
    error::Result,
    key::PointFormat,
};

const PREFERRED_CURVE: &str = "secp256k1";

/// secp256k1, or the first curve with arithmetic when this build leaves it out
fn default_curve() -> Result<Curve> {
    lookup_by_name(PREFERRED_CURVE)
        .ok()
        .filter(Curve::has_arithmetic)
        .or_else(|| curve::curves().find(Curve::has_arithmetic))
        .ok_or_else(|| {
            CryptoError::UnsupportedCurve("no curve with arithmetic in this build".into())
        })
}

/// How ECDSA nonces are produced
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningMode {
    /// RFC 6979 nonces, signatures are reproducible
    #[default]
    Deterministic,
    /// RFC 6979 nonces with fresh entropy mixed in
    Randomized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EccConfig {
    pub curve: Curve,
    pub digest: DigestAlgorithm,
    pub point_format: PointFormat,
    pub signing: SigningMode,
}

impl EccConfig {
    /// Returns a builder for `EccConfig`
    /// Example:
    /// ```
    /// use affinidi_elliptic::config::EccConfig;
    ///
    /// let config = EccConfig::builder().build();
    /// ```
    pub fn builder() -> EccConfigBuilder {
        EccConfigBuilder::default()
    }

    /// Loads a configuration from JSON. Missing fields take their defaults.
    /// Example:
    /// ```
    /// use affinidi_elliptic::config::EccConfig;
    ///
    /// let config = EccConfig::from_json(r#"{"curve": "prime256v1", "digest": "sha384"}"#);
    /// ```
    pub fn from_json(json: &str) -> Result<EccConfig> {
        let builder: EccConfigBuilder = serde_json::from_str(json)
            .map_err(|e| CryptoError::Config(format!("Couldn't parse configuration: {e}")))?;
        builder.build()
    }
}

impl<'de> Deserialize<'de> for EccConfig {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        EccConfigBuilder::deserialize(deserializer)?
            .build()
            .map_err(serde::de::Error::custom)
    }
}

/// Builder for `EccConfig`.
/// Example:
/// ```
/// use affinidi_elliptic::{config::{EccConfig, SigningMode}, digest::DigestAlgorithm};
///
/// let config = EccConfig::builder()
///     .with_curve("secp384r1")
///     .with_digest(DigestAlgorithm::Sha384)
///     .with_signing(SigningMode::Randomized)
///     .build();
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EccConfigBuilder {
    /// Curve name
    /// Default: secp256k1, or the first curve with arithmetic if `k256` is disabled
    curve: Option<String>,

    /// Digest applied to messages before signing
    /// Default: sha256
    digest: DigestAlgorithm,

    /// Encoding returned by `Ecc::public_key()`
    /// Default: uncompressed
    point_format: PointFormat,

    /// Default: deterministic
    signing: SigningMode,
}

impl EccConfigBuilder {
    pub fn new() -> EccConfigBuilder {
        EccConfigBuilder::default()
    }

    /// Build the `EccConfig` from the builder.
    /// Fails if the curve is unknown or has no arithmetic in this build.
    pub fn build(self) -> Result<EccConfig> {
        let curve = match self.curve.as_deref() {
            Some(name) => lookup_by_name(name)
                .map_err(|e| CryptoError::Config(format!("Invalid curve: {e}")))?,
            None => default_curve()?,
        };
        if !curve.has_arithmetic() {
            return Err(CryptoError::UnsupportedCurve(curve.name().to_string()));
        }

        debug!(
            "EccConfig: curve={curve} digest={} format={:?} signing={:?}",
            self.digest, self.point_format, self.signing
        );
        Ok(EccConfig {
            curve,
            digest: self.digest,
            point_format: self.point_format,
            signing: self.signing,
        })
    }

    /// Curve to generate keys on, by standard name
    pub fn with_curve(mut self, name: &str) -> Self {
        self.curve = Some(name.to_string());
        self
    }

    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    pub fn with_point_format(mut self, point_format: PointFormat) -> Self {
        self.point_format = point_format;
        self
    }

    pub fn with_signing(mut self, signing: SigningMode) -> Self {
        self.signing = signing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "k256")]
    #[test]
    fn defaults() {
        let config = EccConfig::builder().build().unwrap();
        assert_eq!(config.curve.name(), "secp256k1");
        assert_eq!(config.digest, DigestAlgorithm::Sha256);
        assert_eq!(config.point_format, PointFormat::Uncompressed);
        assert_eq!(config.signing, SigningMode::Deterministic);
    }

    #[cfg(feature = "p521")]
    #[test]
    fn from_json_with_all_fields() {
        let config = EccConfig::from_json(
            r#"{
                "curve": "secp521r1",
                "digest": "sha512",
                "point_format": "compressed",
                "signing": "randomized"
            }"#,
        )
        .unwrap();
        assert_eq!(config.curve.name(), "secp521r1");
        assert_eq!(config.digest, DigestAlgorithm::Sha512);
        assert_eq!(config.point_format, PointFormat::Compressed);
        assert_eq!(config.signing, SigningMode::Randomized);
    }

    #[cfg(feature = "k256")]
    #[test]
    fn from_json_empty_object_is_default() {
        assert_eq!(
            EccConfig::from_json("{}").unwrap(),
            EccConfig::builder().build().unwrap()
        );
    }

    #[test]
    fn bad_configuration_is_rejected() {
        assert!(matches!(
            EccConfig::from_json(r#"{"curve": "nonexistent-curve"}"#),
            Err(CryptoError::Config(_))
        ));
        assert!(matches!(
            EccConfig::from_json(r#"{"digest": "md5"}"#),
            Err(CryptoError::Config(_))
        ));
        assert!(matches!(
            EccConfig::from_json(r#"{"colour": "blue"}"#),
            Err(CryptoError::Config(_))
        ));
        assert!(matches!(
            EccConfig::from_json("not json"),
            Err(CryptoError::Config(_))
        ));
    }

    #[test]
    fn binary_curve_is_unsupported() {
        assert!(matches!(
            EccConfig::builder().with_curve("sect283k1").build(),
            Err(CryptoError::UnsupportedCurve(_))
        ));
    }

    #[cfg(feature = "p256")]
    #[test]
    fn deserializes_inside_other_structures() {
        #[derive(Deserialize)]
        struct Settings {
            ecc: EccConfig,
        }
        let settings: Settings =
            serde_json::from_str(r#"{"ecc": {"curve": "prime256v1"}}"#).unwrap();
        assert_eq!(settings.ecc.curve.name(), "prime256v1");
    }

    #[cfg(not(feature = "k256"))]
    #[test]
    fn default_curve_without_k256() {
        match EccConfig::builder().build() {
            Ok(config) => {
                assert_ne!(config.curve.name(), "secp256k1");
                assert!(config.curve.has_arithmetic());
            }
            Err(e) => {
                assert!(matches!(e, CryptoError::UnsupportedCurve(_)));
                assert!(curve::curves().all(|c| !c.has_arithmetic()));
            }
        }
    }

    #[test]
    fn default_curve_has_arithmetic() {
        let any_arithmetic = curve::curves().any(|c| c.has_arithmetic());
        match EccConfig::builder().build() {
            Ok(config) => assert!(config.curve.has_arithmetic()),
            Err(e) => {
                assert!(!any_arithmetic);
                assert!(matches!(e, CryptoError::UnsupportedCurve(_)));
            }
        }
    }
}
