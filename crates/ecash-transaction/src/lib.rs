/// eCash SDK - Transactions, signature hashing and the transaction builder.
///
/// Provides the `Tx` model with its wire serialization, BIP143 and legacy
/// sighash preimages (with OP_CODESEPARATOR scoping), signatories, and the
/// `TxBuilder` that computes fees and leftover (change) outputs.

pub mod builder;
pub mod config;
pub mod input;
pub mod output;
pub mod sighash;
pub mod signatory;
pub mod transaction;
pub mod txid;
pub mod unsigned_tx;

mod error;
pub use builder::{SignOptions, TxBuilder, TxBuilderInput, TxBuilderOutput};
pub use config::{FeeConfig, FeeRate};
pub use error::TransactionError;
pub use input::{OutPoint, SignData, TxInput};
pub use output::TxOutput;
pub use sighash::{Preimage, SigHashOutputs, SigHashType};
pub use signatory::{
    flag_signature, sign_with_sighash, signatory_fn, P2PKHSignatory, P2PKSignatory, Signatory,
};
pub use transaction::Tx;
pub use txid::TxId;
pub use unsigned_tx::{UnsignedTx, UnsignedTxInput};

#[cfg(test)]
mod tests;
