//! Token identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::TokenError;

/// Length of a token id in bytes.
pub const TOKEN_ID_LEN: usize = 32;

/// The id of a token: the txid of its GENESIS transaction.
///
/// Held in display order, i.e. the bytes of the hex string users see. SLP
/// writes these bytes as they are; ALP writes them reversed, in the
/// internal order of a txid.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId([u8; TOKEN_ID_LEN]);

impl TokenId {
    /// Parse a token id from its 64-character hex display form.
    ///
    /// # Returns
    /// The id, or `Decode` if the string is not 64 hex characters.
    pub fn from_hex(hex_str: &str) -> Result<Self, TokenError> {
        if hex_str.len() != TOKEN_ID_LEN * 2 {
            return Err(TokenError::Decode(format!(
                "Token ID must be 64 hex characters in length, but got {}",
                hex_str.len()
            )));
        }
        let mut bytes = [0u8; TOKEN_ID_LEN];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|e| TokenError::Decode(format!("Token ID is not hex: {}", e)))?;
        Ok(TokenId(bytes))
    }

    /// Build a token id from bytes in display order.
    pub fn from_be_bytes(bytes: [u8; TOKEN_ID_LEN]) -> Self {
        TokenId(bytes)
    }

    /// Build a token id from bytes in internal txid order.
    pub fn from_le_bytes(mut bytes: [u8; TOKEN_ID_LEN]) -> Self {
        bytes.reverse();
        TokenId(bytes)
    }

    /// The id in display order, as SLP encodes it.
    pub fn to_be_bytes(&self) -> [u8; TOKEN_ID_LEN] {
        self.0
    }

    /// The id in internal txid order, as ALP encodes it.
    pub fn to_le_bytes(&self) -> [u8; TOKEN_ID_LEN] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }

    /// The 64-character hex display form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for TokenId {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenId::from_hex(s)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.to_hex())
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TokenId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
