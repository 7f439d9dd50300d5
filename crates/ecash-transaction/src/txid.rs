//! Transaction identifiers.
//!
//! A `TxId` is stored in internal byte order (the sha256d output as it
//! appears on the wire) and displayed byte-reversed, the way block
//! explorers and wallets show it.

use std::fmt;
use std::str::FromStr;

use ecash_primitives::hash::sha256d;

use crate::TransactionError;

/// Size of a transaction ID in bytes.
pub const TXID_LEN: usize = 32;

/// A 32-byte transaction ID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct TxId([u8; TXID_LEN]);

impl TxId {
    /// Wrap bytes that are already in internal order.
    pub fn new(bytes: [u8; TXID_LEN]) -> Self {
        TxId(bytes)
    }

    /// The ID of a transaction serialized as `tx_bytes`.
    pub fn from_tx_bytes(tx_bytes: &[u8]) -> Self {
        TxId(sha256d(tx_bytes))
    }

    /// Parse a display-order hex string.
    ///
    /// # Arguments
    /// * `hex_str` - 64 hex characters, most significant byte first.
    ///
    /// # Returns
    /// The ID in internal order, or `Serialization` for bad hex or length.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let decoded = hex::decode(hex_str)
            .map_err(|e| TransactionError::Serialization(format!("invalid txid hex: {}", e)))?;
        let mut bytes: [u8; TXID_LEN] = decoded.as_slice().try_into().map_err(|_| {
            TransactionError::Serialization(format!(
                "txid must be {} bytes, got {}",
                TXID_LEN,
                decoded.len()
            ))
        })?;
        bytes.reverse();
        Ok(TxId(bytes))
    }

    /// Internal-order bytes.
    pub fn as_bytes(&self) -> &[u8; TXID_LEN] {
        &self.0
    }

    /// Display-order hex.
    pub fn to_hex(&self) -> String {
        let mut display = self.0;
        display.reverse();
        hex::encode(display)
    }
}

impl From<[u8; TXID_LEN]> for TxId {
    fn from(bytes: [u8; TXID_LEN]) -> Self {
        TxId(bytes)
    }
}

impl FromStr for TxId {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TxId::from_hex(s)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.to_hex())
    }
}
