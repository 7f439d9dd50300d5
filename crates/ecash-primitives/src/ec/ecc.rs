//! The elliptic-curve capability used by transaction signing.
//!
//! Signing code never touches curve arithmetic directly; it goes through
//! [`Ecc`]. [`Secp256k1Ecc`] does the real work, while [`EccDummy`] returns
//! placeholder bytes of the largest size each operation can produce so a
//! transaction can be measured before any key is used.

use crate::ec::keys::{PublicKey, SecretKey};
use crate::ec::{ecdsa, schnorr};
use crate::PrimitivesError;

/// Size of the placeholder ECDSA signature produced by [`EccDummy`].
pub const DUMMY_ECDSA_SIG_LEN: usize = 73;

/// Elliptic-curve operations needed to sign transactions.
pub trait Ecc {
    /// Derive the compressed public key of `sk`.
    fn derive_pubkey(&self, sk: &SecretKey) -> Result<PublicKey, PrimitivesError>;

    /// ECDSA-sign a 32-byte digest, returning DER bytes.
    fn ecdsa_sign(&self, sk: &SecretKey, digest: &[u8; 32]) -> Result<Vec<u8>, PrimitivesError>;

    /// Schnorr-sign a 32-byte digest, returning 64 bytes.
    fn schnorr_sign(&self, sk: &SecretKey, digest: &[u8; 32]) -> Result<Vec<u8>, PrimitivesError>;
}

/// secp256k1 implementation backed by `k256`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Ecc;

impl Ecc for Secp256k1Ecc {
    fn derive_pubkey(&self, sk: &SecretKey) -> Result<PublicKey, PrimitivesError> {
        sk.public_key()
    }

    fn ecdsa_sign(&self, sk: &SecretKey, digest: &[u8; 32]) -> Result<Vec<u8>, PrimitivesError> {
        ecdsa::sign(sk, digest)
    }

    fn schnorr_sign(&self, sk: &SecretKey, digest: &[u8; 32]) -> Result<Vec<u8>, PrimitivesError> {
        Ok(schnorr::sign(sk, digest)?.to_vec())
    }
}

/// Size-estimation stand-in.
///
/// Returns an all-zero 33-byte public key, a 73-byte ECDSA signature (one
/// more than the longest DER encoding, covering the worst case) and a 64-byte
/// Schnorr signature. Output depends only on the operation, never on the key
/// or digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct EccDummy;

impl Ecc for EccDummy {
    fn derive_pubkey(&self, _sk: &SecretKey) -> Result<PublicKey, PrimitivesError> {
        Ok(PublicKey::placeholder())
    }

    fn ecdsa_sign(&self, _sk: &SecretKey, _digest: &[u8; 32]) -> Result<Vec<u8>, PrimitivesError> {
        Ok(vec![0u8; DUMMY_ECDSA_SIG_LEN])
    }

    fn schnorr_sign(&self, _sk: &SecretKey, _digest: &[u8; 32]) -> Result<Vec<u8>, PrimitivesError> {
        Ok(vec![0u8; schnorr::SCHNORR_SIG_LEN])
    }
}
