//! Transactions prepared for signing.
//!
//! [`UnsignedTx`] owns a transaction together with the three BIP143
//! whole-transaction hashes, computed once so that signing N inputs does
//! not hash the transaction N times. [`UnsignedTxInput`] is a view of one
//! input of it and builds that input's sighash preimage.

use ecash_primitives::hash::sha256d;
use ecash_primitives::util::ByteWriter;
use ecash_script::Script;
use tracing::trace;

use crate::input::{SignData, TxInput};
use crate::sighash::{bip143_preimage, legacy_preimage, Preimage, SigHashType};
use crate::transaction::Tx;
use crate::TransactionError;

/// A transaction plus cached hashes of its prevouts, sequences and outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTx {
    tx: Tx,
    /// sha256d of all outpoints.
    pub prevouts_hash: [u8; 32],
    /// sha256d of all sequence numbers.
    pub sequences_hash: [u8; 32],
    /// sha256d of all serialized outputs.
    pub outputs_hash: [u8; 32],
}

impl UnsignedTx {
    /// Wrap `tx` and compute its hashes.
    pub fn from_tx(tx: Tx) -> Self {
        let mut prevouts = ByteWriter::with_capacity(tx.inputs.len() * 36);
        let mut sequences = ByteWriter::with_capacity(tx.inputs.len() * 4);
        for input in &tx.inputs {
            input.prev_out.write_to(&mut prevouts);
            sequences.write_u32_le(input.sequence);
        }
        let mut outputs = ByteWriter::new();
        for output in &tx.outputs {
            output.write_to(&mut outputs);
        }
        UnsignedTx {
            prevouts_hash: sha256d(prevouts.as_bytes()),
            sequences_hash: sha256d(sequences.as_bytes()),
            outputs_hash: sha256d(outputs.as_bytes()),
            tx,
        }
    }

    /// Wrap `tx` with all-zero hashes.
    ///
    /// Preimages from a dummy are wrong but have the right size, which is
    /// all fee estimation needs.
    pub fn dummy_from_tx(tx: Tx) -> Self {
        UnsignedTx {
            tx,
            prevouts_hash: [0u8; 32],
            sequences_hash: [0u8; 32],
            outputs_hash: [0u8; 32],
        }
    }

    /// The wrapped transaction.
    pub fn tx(&self) -> &Tx {
        &self.tx
    }

    /// Unwrap the transaction.
    pub fn into_tx(self) -> Tx {
        self.tx
    }

    /// A view of input `input_idx`.
    ///
    /// # Returns
    /// The view, or `InputIndexOutOfRange`.
    pub fn input_at(&self, input_idx: usize) -> Result<UnsignedTxInput<'_>, TransactionError> {
        if input_idx >= self.tx.inputs.len() {
            return Err(TransactionError::InputIndexOutOfRange {
                index: input_idx,
                count: self.tx.inputs.len(),
            });
        }
        Ok(UnsignedTxInput {
            input_idx,
            unsigned_tx: self,
        })
    }

    /// Views of all inputs in order.
    pub fn inputs(&self) -> impl Iterator<Item = UnsignedTxInput<'_>> {
        (0..self.tx.inputs.len()).map(move |input_idx| UnsignedTxInput {
            input_idx,
            unsigned_tx: self,
        })
    }
}

/// One input of an [`UnsignedTx`].
#[derive(Clone, Copy, Debug)]
pub struct UnsignedTxInput<'a> {
    input_idx: usize,
    unsigned_tx: &'a UnsignedTx,
}

impl<'a> UnsignedTxInput<'a> {
    /// Index of this input.
    pub fn input_idx(&self) -> usize {
        self.input_idx
    }

    /// The transaction this input belongs to.
    pub fn unsigned_tx(&self) -> &'a UnsignedTx {
        self.unsigned_tx
    }

    /// The input itself.
    pub fn tx_input(&self) -> &'a TxInput {
        &self.unsigned_tx.tx.inputs[self.input_idx]
    }

    /// Build the sighash preimage of this input.
    ///
    /// The script committed to is the redeem script if one is set, else
    /// the output script. A P2SH output script alone is rejected because
    /// its redeem script is unknown.
    ///
    /// # Arguments
    /// * `sig_hash_type` - Selects the digest algorithm and committed parts.
    /// * `n_codesep` - `None` or `Some(0)` commits to the whole script;
    ///   `Some(n)` to the part after the n-th OP_CODESEPARATOR.
    ///
    /// # Returns
    /// The preimage, `MissingSignData` if the input cannot be signed,
    /// `Script(CodesepIndexOutOfRange)` if `n` exceeds the separators in
    /// the script, or `InvalidSigHash` for legacy SINGLE without a
    /// matching output.
    pub fn sig_hash_preimage(
        &self,
        sig_hash_type: SigHashType,
        n_codesep: Option<usize>,
    ) -> Result<Preimage, TransactionError> {
        let sign_data = self.tx_input().sign_data.as_ref().ok_or_else(|| {
            TransactionError::MissingSignData("Input must have signData set".to_string())
        })?;
        let redeem_script = signed_script(sign_data)?;
        let script_code = redeem_script.cut_out_codesep(n_codesep.unwrap_or(0))?;
        trace!(
            input_idx = self.input_idx,
            %sig_hash_type,
            script_code_len = script_code.len(),
            "building sighash preimage"
        );

        let bytes = if sig_hash_type.bip143 {
            bip143_preimage(
                self.unsigned_tx,
                self.input_idx,
                &script_code,
                sign_data.value,
                sig_hash_type,
            )
        } else {
            let stripped = script_code.strip_codeseps()?;
            legacy_preimage(self.unsigned_tx, self.input_idx, &stripped, sig_hash_type)?
        };

        Ok(Preimage {
            bytes,
            script_code,
            redeem_script: redeem_script.clone(),
        })
    }
}

fn signed_script(sign_data: &SignData) -> Result<&Script, TransactionError> {
    if let Some(redeem_script) = &sign_data.redeem_script {
        return Ok(redeem_script);
    }
    match &sign_data.output_script {
        Some(output_script) if output_script.is_p2sh() => Err(TransactionError::MissingSignData(
            "P2SH requires redeemScript to be set, not outputScript".to_string(),
        )),
        Some(output_script) => Ok(output_script),
        None => Err(TransactionError::MissingSignData(
            "Must either set outputScript or redeemScript".to_string(),
        )),
    }
}
