//! Hash functions used by eCash scripts, transactions and addresses.
//!
//! `sha256d` identifies transactions and commits sighash components,
//! `sha_rmd160` produces the 20-byte payloads of P2PKH/P2SH scripts and
//! addresses, and `sha256_hmac` drives deterministic nonce generation.

use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::PrimitivesError;

type HmacSha256 = Hmac<Sha256>;

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compute SHA-256(SHA-256(data)).
///
/// Used for transaction ids, the cached sighash components and
/// base58check checksums.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute the RIPEMD-160 digest of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// Compute RIPEMD-160(SHA-256(data)).
///
/// # Arguments
/// * `data` - A public key or a redeem script.
///
/// # Returns
/// The 20-byte hash committed to by P2PKH and P2SH scripts.
pub fn sha_rmd160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// Compute HMAC-SHA256 over the concatenation of `parts`.
///
/// # Arguments
/// * `key` - The HMAC key bytes.
/// * `parts` - Message fragments, fed to the MAC in order.
///
/// # Returns
/// `Ok` with the 32-byte tag, or an error if the key is rejected.
pub fn sha256_hmac(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 32], PrimitivesError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| PrimitivesError::Other(format!("hmac key: {}", e)))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().into())
}
