//! 64-byte Schnorr signatures as used by eCash consensus.
//!
//! A signature is `R.x || s` where `R = kG` is chosen so that `R.y` is a
//! quadratic residue mod p, `e = sha256(R.x || P || m)` with `P` the
//! compressed public key, and `s = k + e*x mod n`. BIP143 sighash types
//! sign with this scheme.
//!
//! Nonces come from an RFC6979 HMAC-SHA256 stream keyed on the secret key
//! and digest, with the algorithm tag `"Schnorr+SHA256  "` appended so they
//! never collide with ECDSA nonces for the same key and message.

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{AffinePoint, FieldBytes, FieldElement, ProjectivePoint, Scalar, U256};

use crate::ec::keys::{PublicKey, SecretKey};
use crate::hash::{sha256, sha256_hmac};
use crate::PrimitivesError;

/// Length of a Schnorr signature.
pub const SCHNORR_SIG_LEN: usize = 64;

/// Extra data mixed into the nonce derivation.
const NONCE_ALGO_TAG: &[u8; 16] = b"Schnorr+SHA256  ";

/// Sign a 32-byte digest.
///
/// # Arguments
/// * `sk` - The signing key.
/// * `digest` - The already-hashed message.
///
/// # Returns
/// `Ok([u8; 64])` containing `R.x || s`.
pub fn sign(sk: &SecretKey, digest: &[u8; 32]) -> Result<[u8; SCHNORR_SIG_LEN], PrimitivesError> {
    let x = sk.to_scalar()?;
    let pk = sk.public_key()?;
    let mut k = nonce(sk, digest)?;

    let r_point = (ProjectivePoint::GENERATOR * k).to_affine();
    let (r_x, r_y) = affine_coordinates(&r_point)?;
    if !is_quadratic_residue(&r_y) {
        k = -k;
    }

    let e = challenge(&r_x, &pk, digest);
    let s = k + e * x;

    let mut sig = [0u8; SCHNORR_SIG_LEN];
    sig[..32].copy_from_slice(&r_x);
    sig[32..].copy_from_slice(&s.to_bytes());
    Ok(sig)
}

/// Verify a 64-byte Schnorr signature over a 32-byte digest.
pub fn verify(pk: &PublicKey, digest: &[u8; 32], sig: &[u8]) -> bool {
    if sig.len() != SCHNORR_SIG_LEN {
        return false;
    }
    let Ok(p) = pk.to_projective() else {
        return false;
    };
    let mut r_x = [0u8; 32];
    r_x.copy_from_slice(&sig[..32]);
    let s_bytes = U256::from_be_slice(&sig[32..]);
    let s = <Scalar as Reduce<U256>>::reduce(s_bytes);
    if s.to_bytes()[..] != sig[32..] {
        // s was not below the group order
        return false;
    }

    let e = challenge(&r_x, pk, digest);
    let r_point = (ProjectivePoint::GENERATOR * s - p * e).to_affine();
    match affine_coordinates(&r_point) {
        Ok((x, y)) => x == r_x && is_quadratic_residue(&y),
        Err(_) => false,
    }
}

/// `e = sha256(R.x || P || m) mod n`.
fn challenge(r_x: &[u8; 32], pk: &PublicKey, digest: &[u8; 32]) -> Scalar {
    let mut preimage = Vec::with_capacity(32 + 33 + 32);
    preimage.extend_from_slice(r_x);
    preimage.extend_from_slice(pk.as_bytes());
    preimage.extend_from_slice(digest);
    let hash = sha256(&preimage);
    <Scalar as Reduce<U256>>::reduce(U256::from_be_slice(&hash))
}

/// RFC6979 nonce with the Schnorr algorithm tag as additional data.
fn nonce(sk: &SecretKey, digest: &[u8; 32]) -> Result<Scalar, PrimitivesError> {
    let key_bytes = sk.as_bytes();
    let mut v = [0x01u8; 32];
    let mut k = [0x00u8; 32];

    k = sha256_hmac(&k, &[&v, &[0x00], key_bytes, digest, NONCE_ALGO_TAG])?;
    v = sha256_hmac(&k, &[&v])?;
    k = sha256_hmac(&k, &[&v, &[0x01], key_bytes, digest, NONCE_ALGO_TAG])?;
    v = sha256_hmac(&k, &[&v])?;

    loop {
        v = sha256_hmac(&k, &[&v])?;
        let candidate = <Scalar as Reduce<U256>>::reduce(U256::from_be_slice(&v));
        // Reject values that wrapped or are zero.
        if candidate.to_bytes()[..] == v[..] && candidate != Scalar::ZERO {
            return Ok(candidate);
        }
        k = sha256_hmac(&k, &[&v, &[0x00]])?;
        v = sha256_hmac(&k, &[&v])?;
    }
}

fn affine_coordinates(point: &AffinePoint) -> Result<([u8; 32], [u8; 32]), PrimitivesError> {
    let encoded = point.to_encoded_point(false);
    match (encoded.x(), encoded.y()) {
        (Some(x), Some(y)) => {
            let mut out_x = [0u8; 32];
            let mut out_y = [0u8; 32];
            out_x.copy_from_slice(x);
            out_y.copy_from_slice(y);
            Ok((out_x, out_y))
        }
        _ => Err(PrimitivesError::InvalidSignature(
            "point at infinity".to_string(),
        )),
    }
}

/// `y` is a square mod p. Zero and out-of-field encodings are not.
fn is_quadratic_residue(y: &[u8; 32]) -> bool {
    let Some(y) = Option::<FieldElement>::from(FieldElement::from_bytes(&FieldBytes::from(*y)))
    else {
        return false;
    };
    !bool::from(y.is_zero()) && bool::from(y.sqrt().is_some())
}
