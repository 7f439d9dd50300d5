//! ECDSA over secp256k1 with low-S DER output.
//!
//! Legacy sighash types sign with ECDSA. Nonces are RFC6979-deterministic,
//! so the same key and digest always yield the same signature.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::Signature;

use crate::ec::keys::{PublicKey, SecretKey};
use crate::PrimitivesError;

/// Largest DER signature on secp256k1 (two 33-byte integers plus headers).
pub const MAX_DER_LEN: usize = 72;

/// Sign a 32-byte digest and return the DER-encoded signature.
///
/// The S value is normalized to the lower half of the curve order.
///
/// # Arguments
/// * `sk` - The signing key.
/// * `digest` - The already-hashed message.
///
/// # Returns
/// `Ok(Vec<u8>)` of at most `MAX_DER_LEN` bytes.
pub fn sign(sk: &SecretKey, digest: &[u8; 32]) -> Result<Vec<u8>, PrimitivesError> {
    let signing_key = sk.signing_key()?;
    let sig: Signature = signing_key
        .sign_prehash(digest)
        .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
    let sig = sig.normalize_s().unwrap_or(sig);
    Ok(sig.to_der().as_bytes().to_vec())
}

/// Verify a DER signature over a 32-byte digest.
///
/// High-S signatures are rejected.
pub fn verify(pk: &PublicKey, digest: &[u8; 32], der: &[u8]) -> bool {
    let Ok(sig) = Signature::from_der(der) else {
        return false;
    };
    if sig.normalize_s().is_some() {
        return false;
    }
    match pk.verifying_key() {
        Ok(key) => key.verify_prehash(digest, &sig).is_ok(),
        Err(_) => false,
    }
}
