//! Base58 and base58check encoding.
//!
//! Legacy (pre-CashAddr) addresses are `base58check(version || hash160)`,
//! where the checksum is the first four bytes of SHA-256d of the payload.

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Length of the base58check checksum.
const CHECKSUM_LEN: usize = 4;

/// Encode bytes with the Bitcoin base58 alphabet.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_string()
}

/// Decode a base58 string.
pub fn decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))
}

/// Append a 4-byte SHA-256d checksum to `data` and base58-encode it.
pub fn check_encode(data: &[u8]) -> String {
    let checksum = sha256d(data);
    let mut payload = Vec::with_capacity(data.len() + CHECKSUM_LEN);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    encode(&payload)
}

/// Decode a base58check string and verify its checksum.
///
/// # Returns
/// The payload without its checksum, `InvalidBase58` for bad characters or
/// a payload shorter than the checksum, or `ChecksumMismatch`.
pub fn check_decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    let mut decoded = decode(s)?;
    if decoded.len() < CHECKSUM_LEN {
        return Err(PrimitivesError::InvalidBase58(
            "data too short for checksum".to_string(),
        ));
    }
    let checksum = decoded.split_off(decoded.len() - CHECKSUM_LEN);
    if checksum != sha256d(&decoded)[..CHECKSUM_LEN] {
        return Err(PrimitivesError::ChecksumMismatch);
    }
    Ok(decoded)
}
