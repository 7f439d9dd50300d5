#![deny(missing_docs)]
//! eCash token coloring: SLP and ALP encoders and EMPP bundling.
//!
//! SLP encoders return a complete `OP_RETURN` script for output 0. ALP
//! encoders return sections, which [`empp_script`] bundles into one output
//! so a single transaction can color outputs for several tokens.

pub mod alp;
pub mod empp;
pub mod error;
pub mod slp;
pub mod token_id;
pub mod types;

pub use alp::{alp_burn, alp_genesis, alp_mint, alp_send};
pub use empp::{empp_script, parse_empp};
pub use error::TokenError;
pub use slp::{slp_burn, slp_genesis, slp_mint, slp_mint_vault, slp_send};
pub use token_id::TokenId;
pub use types::{
    GenesisInfo, MintData, TokenOutput, TokenProtocol, TokenType, ALP_STANDARD, SLP_FUNGIBLE,
    SLP_MINT_VAULT, SLP_NFT1_CHILD, SLP_NFT1_GROUP,
};
