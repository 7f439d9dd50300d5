//! Common types for token operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TokenId;

/// SLP fungible token, minted with a baton.
pub const SLP_FUNGIBLE: u8 = 1;
/// SLP fungible token whose minting is gated by a script hash.
pub const SLP_MINT_VAULT: u8 = 2;
/// SLP NFT1 group token; its atoms fund NFT1 child geneses.
pub const SLP_NFT1_GROUP: u8 = 0x81;
/// SLP NFT1 child token, a single NFT of a group.
pub const SLP_NFT1_CHILD: u8 = 0x41;
/// The standard ALP token type.
pub const ALP_STANDARD: u8 = 0;

/// The coloring protocol a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenProtocol {
    /// Single `OP_RETURN` push protocol.
    Slp,
    /// Sections bundled in an EMPP output.
    Alp,
}

/// A protocol together with its numeric token type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenType {
    /// The protocol.
    pub protocol: TokenProtocol,
    /// The type number within the protocol.
    pub number: u8,
}

impl TokenType {
    /// SLP fungible.
    pub const SLP_FUNGIBLE: TokenType = TokenType::slp(SLP_FUNGIBLE);
    /// SLP mint vault.
    pub const SLP_MINT_VAULT: TokenType = TokenType::slp(SLP_MINT_VAULT);
    /// SLP NFT1 group.
    pub const SLP_NFT1_GROUP: TokenType = TokenType::slp(SLP_NFT1_GROUP);
    /// SLP NFT1 child.
    pub const SLP_NFT1_CHILD: TokenType = TokenType::slp(SLP_NFT1_CHILD);
    /// ALP standard.
    pub const ALP_STANDARD: TokenType = TokenType::alp(ALP_STANDARD);

    /// An SLP token type.
    pub const fn slp(number: u8) -> Self {
        TokenType {
            protocol: TokenProtocol::Slp,
            number,
        }
    }

    /// An ALP token type.
    pub const fn alp(number: u8) -> Self {
        TokenType {
            protocol: TokenProtocol::Alp,
            number,
        }
    }

    /// Whether the encoders of this crate support the type.
    pub fn is_known(&self) -> bool {
        match self.protocol {
            TokenProtocol::Slp => matches!(
                self.number,
                SLP_FUNGIBLE | SLP_MINT_VAULT | SLP_NFT1_GROUP | SLP_NFT1_CHILD
            ),
            TokenProtocol::Alp => self.number == ALP_STANDARD,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.protocol, self.number) {
            (TokenProtocol::Slp, SLP_FUNGIBLE) => write!(f, "SLP_TOKEN_TYPE_FUNGIBLE"),
            (TokenProtocol::Slp, SLP_MINT_VAULT) => write!(f, "SLP_TOKEN_TYPE_MINT_VAULT"),
            (TokenProtocol::Slp, SLP_NFT1_GROUP) => write!(f, "SLP_TOKEN_TYPE_NFT1_GROUP"),
            (TokenProtocol::Slp, SLP_NFT1_CHILD) => write!(f, "SLP_TOKEN_TYPE_NFT1_CHILD"),
            (TokenProtocol::Alp, ALP_STANDARD) => write!(f, "ALP_TOKEN_TYPE_STANDARD"),
            (TokenProtocol::Slp, n) => write!(f, "SLP_TOKEN_TYPE_UNKNOWN({})", n),
            (TokenProtocol::Alp, n) => write!(f, "ALP_TOKEN_TYPE_UNKNOWN({})", n),
        }
    }
}

/// Descriptive fields of a GENESIS.
///
/// Unset fields are encoded empty. `hash` and `mint_vault_scripthash` are
/// SLP only; `data` and `auth_pubkey` are ALP only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisInfo {
    /// Short ticker, e.g. `CRD`.
    pub token_ticker: Option<String>,
    /// Full token name.
    pub token_name: Option<String>,
    /// Document URL.
    pub url: Option<String>,
    /// 32-byte document hash (SLP).
    #[serde(with = "hex_opt")]
    pub hash: Option<Vec<u8>>,
    /// 20-byte hash of the script allowed to mint (SLP mint vault).
    #[serde(with = "hex_opt")]
    pub mint_vault_scripthash: Option<Vec<u8>>,
    /// Arbitrary extra data (ALP).
    #[serde(with = "hex_opt")]
    pub data: Option<Vec<u8>>,
    /// Public key of the token's authority (ALP).
    #[serde(with = "hex_opt")]
    pub auth_pubkey: Option<Vec<u8>>,
    /// Number of decimal places, 0 to 9.
    pub decimals: Option<u8>,
}

mod hex_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Atoms created by an ALP GENESIS or MINT.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintData {
    /// Atoms for outputs 1, 2, ... in order.
    pub atoms_array: Vec<u64>,
    /// Number of mint batons, placed on the outputs right after the atoms.
    pub num_batons: u8,
}

/// The coloring of one transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOutput {
    /// Token the output carries.
    pub token_id: TokenId,
    /// Type of that token.
    pub token_type: TokenType,
    /// Atoms on the output; 0 for a mint baton.
    pub atoms: u64,
    /// Whether the output is a mint baton.
    pub is_mint_baton: bool,
    /// Index of the EMPP section that colored the output; 0 for SLP.
    pub entry_idx: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_types() {
        assert!(TokenType::SLP_FUNGIBLE.is_known());
        assert!(TokenType::SLP_NFT1_CHILD.is_known());
        assert!(TokenType::ALP_STANDARD.is_known());
        assert!(!TokenType::slp(0).is_known());
        assert!(!TokenType::alp(1).is_known());
        assert_eq!(TokenType::SLP_MINT_VAULT.to_string(), "SLP_TOKEN_TYPE_MINT_VAULT");
        assert_eq!(TokenType::slp(99).to_string(), "SLP_TOKEN_TYPE_UNKNOWN(99)");
    }

    #[test]
    fn test_genesis_info_serde() {
        let info = GenesisInfo {
            token_ticker: Some("CRD".to_string()),
            hash: Some(vec![0xab; 32]),
            decimals: Some(4),
            ..GenesisInfo::default()
        };
        let json = serde_json::to_value(&info).expect("serializes");
        assert_eq!(json["hash"], serde_json::json!("ab".repeat(32)));
        assert_eq!(json["data"], serde_json::Value::Null);
        let restored: GenesisInfo = serde_json::from_value(json).expect("deserializes");
        assert_eq!(restored, info);

        let partial: GenesisInfo =
            serde_json::from_str(r#"{"token_name":"x"}"#).expect("deserializes");
        assert_eq!(partial.token_name.as_deref(), Some("x"));
        assert_eq!(partial.hash, None);
    }
}
