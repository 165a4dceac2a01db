//! Group arithmetic backends
//!
//! Each curve with arithmetic support maps to one RustCrypto curve type. The
//! rest of the crate talks to it through [`CurveOps`], which works purely on
//! big-endian scalars and SEC1 encoded points.

use std::marker::PhantomData;

use ecdsa::{
    Signature, SignatureSize, SigningKey, VerifyingKey,
    hazmat::{DigestPrimitive, SignPrimitive, VerifyPrimitive},
    signature::hazmat::{PrehashSigner, PrehashVerifier, RandomizedPrehashSigner},
};
use elliptic_curve::{
    AffinePoint, CurveArithmetic, FieldBytesSize, PrimeCurve, PublicKey, Scalar, SecretKey,
    generic_array::{ArrayLength, typenum::Unsigned},
    ops::Invert,
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    subtle::CtOption,
};
use zeroize::Zeroizing;

use crate::{CryptoError, curve::Curve, error::Result, random};

/// Operations a curve backend provides
pub(crate) trait CurveOps: Send + Sync {
    /// Is `scalar` a valid private scalar (in `[1, n)`, correct width)?
    fn is_valid_scalar(&self, scalar: &[u8]) -> bool;

    /// `scalar * G` as an uncompressed SEC1 point
    fn public_point(&self, scalar: &[u8]) -> Result<Vec<u8>>;

    /// Parses and validates a SEC1 point, returning it uncompressed
    fn decode_point(&self, encoded: &[u8]) -> Result<Vec<u8>>;

    /// X coordinate of `scalar * peer`
    fn diffie_hellman(&self, scalar: &[u8], peer: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// ECDSA over a prehashed message, returning fixed width `r || s`.
    /// `randomized` mixes fresh entropy into the RFC 6979 nonce.
    fn sign_prehash(&self, scalar: &[u8], digest: &[u8], randomized: bool) -> Result<Vec<u8>>;

    /// Checks a fixed width `r || s` signature. Out of range scalars are a
    /// failed verification, not an error.
    fn verify_prehash(&self, public: &[u8], digest: &[u8], signature: &[u8]) -> Result<bool>;
}

/// The ECDSA half of a backend. Most curves use the generic `ecdsa` key
/// types; P-521 ships its own signing and verifying keys.
pub(crate) trait EcdsaScheme {
    fn sign(scalar: &[u8], digest: &[u8], randomized: bool) -> Result<Vec<u8>>;

    fn verify(public: &[u8], digest: &[u8], signature: &[u8]) -> Result<bool>;
}

fn signing_error(e: ecdsa::Error) -> CryptoError {
    CryptoError::Signing(format!("ECDSA signing failed: {e}"))
}

fn invalid_signing_scalar(e: ecdsa::Error) -> CryptoError {
    CryptoError::Signing(format!("Private scalar isn't valid: {e}"))
}

// Callers pass the point of an already validated `KeyPair`, so this only
// fires if that invariant is broken
fn invalid_verifying_point(e: ecdsa::Error) -> CryptoError {
    CryptoError::InvalidEncoding(format!("Public point isn't valid: {e}"))
}

/// `ecdsa::SigningKey<C>` / `ecdsa::VerifyingKey<C>`
pub(crate) struct GenericEcdsa<C>(PhantomData<fn() -> C>);

impl<C> EcdsaScheme for GenericEcdsa<C>
where
    C: PrimeCurve + CurveArithmetic + DigestPrimitive,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C> + VerifyPrimitive<C>,
    FieldBytesSize<C>: ModulusSize,
    Scalar<C>: Invert<Output = CtOption<Scalar<C>>> + SignPrimitive<C>,
    SignatureSize<C>: ArrayLength<u8>,
{
    fn sign(scalar: &[u8], digest: &[u8], randomized: bool) -> Result<Vec<u8>> {
        let key = SigningKey::<C>::from_slice(scalar).map_err(invalid_signing_scalar)?;

        let signed: std::result::Result<Signature<C>, ecdsa::Error> = if randomized {
            let mut rng = random::seeded_rng()?;
            key.sign_prehash_with_rng(&mut rng, digest)
        } else {
            key.sign_prehash(digest)
        };
        Ok(signed.map_err(signing_error)?.to_bytes().to_vec())
    }

    fn verify(public: &[u8], digest: &[u8], signature: &[u8]) -> Result<bool> {
        let key = VerifyingKey::<C>::from_sec1_bytes(public).map_err(invalid_verifying_point)?;
        let Ok(signature) = Signature::<C>::from_slice(signature) else {
            return Ok(false);
        };
        Ok(key.verify_prehash(digest, &signature).is_ok())
    }
}

/// `p521::ecdsa` keys. `NistP521` has no `DigestPrimitive`, so the generic
/// `ecdsa` key types don't apply to it.
#[cfg(feature = "p521")]
pub(crate) struct P521Ecdsa;

#[cfg(feature = "p521")]
impl EcdsaScheme for P521Ecdsa {
    fn sign(scalar: &[u8], digest: &[u8], randomized: bool) -> Result<Vec<u8>> {
        let key = p521::ecdsa::SigningKey::from_slice(scalar).map_err(invalid_signing_scalar)?;

        let signed: std::result::Result<p521::ecdsa::Signature, ecdsa::Error> = if randomized {
            let mut rng = random::seeded_rng()?;
            key.sign_prehash_with_rng(&mut rng, digest)
        } else {
            key.sign_prehash(digest)
        };
        Ok(signed.map_err(signing_error)?.to_bytes().to_vec())
    }

    fn verify(public: &[u8], digest: &[u8], signature: &[u8]) -> Result<bool> {
        let key =
            p521::ecdsa::VerifyingKey::from_sec1_bytes(public).map_err(invalid_verifying_point)?;
        let Ok(signature) = p521::ecdsa::Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(key.verify_prehash(digest, &signature).is_ok())
    }
}

/// Group arithmetic over curve `C`, with ECDSA provided by `E`
pub(crate) struct Arithmetic<C, E>(PhantomData<fn() -> (C, E)>);

impl<C, E> Arithmetic<C, E> {
    const fn new() -> Self {
        Arithmetic(PhantomData)
    }
}

/// Parses a private scalar of exactly the field width
fn secret_key<C>(scalar: &[u8]) -> Option<SecretKey<C>>
where
    C: CurveArithmetic,
{
    if scalar.len() != <FieldBytesSize<C> as Unsigned>::USIZE {
        return None;
    }
    SecretKey::<C>::from_slice(scalar).ok()
}

impl<C, E> CurveOps for Arithmetic<C, E>
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
    E: EcdsaScheme,
{
    fn is_valid_scalar(&self, scalar: &[u8]) -> bool {
        secret_key::<C>(scalar).is_some()
    }

    fn public_point(&self, scalar: &[u8]) -> Result<Vec<u8>> {
        let secret = secret_key::<C>(scalar)
            .ok_or_else(|| CryptoError::InvalidEncoding("Private scalar isn't valid".into()))?;
        Ok(secret.public_key().to_encoded_point(false).as_bytes().to_vec())
    }

    fn decode_point(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        // from_sec1_bytes rejects points that aren't on the curve and the identity
        let public = PublicKey::<C>::from_sec1_bytes(encoded)
            .map_err(|e| CryptoError::InvalidEncoding(format!("Public point isn't valid: {e}")))?;
        Ok(public.to_encoded_point(false).as_bytes().to_vec())
    }

    fn diffie_hellman(&self, scalar: &[u8], peer: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let secret = secret_key::<C>(scalar)
            .ok_or_else(|| CryptoError::Ecdh("Private scalar isn't valid".into()))?;
        let peer = PublicKey::<C>::from_sec1_bytes(peer)
            .map_err(|e| CryptoError::Ecdh(format!("Peer public point isn't valid: {e}")))?;

        let shared =
            elliptic_curve::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
        Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
    }

    fn sign_prehash(&self, scalar: &[u8], digest: &[u8], randomized: bool) -> Result<Vec<u8>> {
        E::sign(scalar, digest, randomized)
    }

    fn verify_prehash(&self, public: &[u8], digest: &[u8], signature: &[u8]) -> Result<bool> {
        E::verify(public, digest, signature)
    }
}

#[cfg(feature = "p256")]
static P256: Arithmetic<p256::NistP256, GenericEcdsa<p256::NistP256>> = Arithmetic::new();
#[cfg(feature = "k256")]
static SECP256K1: Arithmetic<k256::Secp256k1, GenericEcdsa<k256::Secp256k1>> = Arithmetic::new();
#[cfg(feature = "p384")]
static P384: Arithmetic<p384::NistP384, GenericEcdsa<p384::NistP384>> = Arithmetic::new();
#[cfg(feature = "p521")]
static P521: Arithmetic<p521::NistP521, P521Ecdsa> = Arithmetic::new();
#[cfg(feature = "p224")]
static P224: Arithmetic<p224::NistP224, GenericEcdsa<p224::NistP224>> = Arithmetic::new();

/// Backend for `curve`, if this build has one
pub(crate) fn backend(curve: &Curve) -> Option<&'static dyn CurveOps> {
    use crate::capability::Capability;

    match curve.capability()? {
        #[cfg(feature = "p256")]
        Capability::P256 => Some(&P256),
        #[cfg(feature = "k256")]
        Capability::Secp256k1 => Some(&SECP256K1),
        #[cfg(feature = "p384")]
        Capability::P384 => Some(&P384),
        #[cfg(feature = "p521")]
        Capability::P521 => Some(&P521),
        #[cfg(feature = "p224")]
        Capability::P224 => Some(&P224),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// Like [`backend`] but fails with [`CryptoError::UnsupportedCurve`]
pub(crate) fn require(curve: &Curve) -> Result<&'static dyn CurveOps> {
    backend(curve).ok_or_else(|| CryptoError::UnsupportedCurve(curve.name().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::lookup_by_name;

    #[test]
    fn arithmetic_curves_have_backends() {
        for name in ["prime256v1", "secp256k1", "secp384r1", "secp521r1", "secp224r1"] {
            let curve = lookup_by_name(name).unwrap();
            assert_eq!(backend(&curve).is_some(), curve.has_arithmetic(), "{name}");
        }
    }

    #[test]
    fn other_curves_are_unsupported() {
        let curve = lookup_by_name("secp160r1").unwrap();
        assert!(matches!(require(&curve), Err(CryptoError::UnsupportedCurve(_))));
    }

    #[cfg(feature = "p521")]
    #[test]
    fn p521_uses_its_own_ecdsa_keys() {
        let curve = lookup_by_name("secp521r1").unwrap();
        let ops = require(&curve).unwrap();

        let mut scalar = [0u8; 66];
        scalar[65] = 7;
        let public = ops.public_point(&scalar).unwrap();
        assert_eq!(public.len(), 1 + 2 * 66);

        let digest = [0x5au8; 64];
        let signature = ops.sign_prehash(&scalar, &digest, false).unwrap();
        assert_eq!(signature.len(), 132);
        assert_eq!(signature, ops.sign_prehash(&scalar, &digest, false).unwrap());
        assert!(ops.verify_prehash(&public, &digest, &signature).unwrap());

        let randomized = ops.sign_prehash(&scalar, &digest, true).unwrap();
        assert!(ops.verify_prehash(&public, &digest, &randomized).unwrap());
        assert!(!ops.verify_prehash(&public, &[0xa5u8; 64], &randomized).unwrap());
    }

    #[cfg(feature = "p256")]
    #[test]
    fn verify_with_broken_point_is_an_encoding_error() {
        let ops = require(&lookup_by_name("prime256v1").unwrap()).unwrap();
        assert!(matches!(
            ops.verify_prehash(&[0x04, 1, 2, 3], &[0u8; 32], &[1u8; 64]),
            Err(CryptoError::InvalidEncoding(_))
        ));
    }
}
