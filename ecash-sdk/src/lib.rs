#![deny(missing_docs)]

//! eCash SDK - Complete SDK.
//!
//! Re-exports all eCash SDK components for convenient single-crate usage.

pub use ecash_primitives as primitives;
pub use ecash_script as script;
pub use ecash_tokens as tokens;
pub use ecash_transaction as transaction;

pub use ecash_primitives::ec::{Ecc, EccDummy, PublicKey, SecretKey, Secp256k1Ecc};
pub use ecash_script::{Address, Script};
pub use ecash_tokens::{empp_script, TokenId};
pub use ecash_transaction::{SigHashType, SignOptions, Tx, TxBuilder};
