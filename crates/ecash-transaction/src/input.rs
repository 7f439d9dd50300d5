//! Transaction inputs and the data needed to sign them.

use ecash_primitives::util::{ByteReader, ByteWriter};
use ecash_script::Script;

use crate::txid::TxId;
use crate::TransactionError;

/// Sequence number of a final input.
pub const DEFAULT_SEQUENCE: u32 = 0xffff_ffff;

/// Reference to an output of a previous transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct OutPoint {
    /// ID of the transaction holding the output.
    pub txid: TxId,
    /// Index of the output in that transaction.
    pub out_idx: u32,
}

impl OutPoint {
    /// Write `txid || out_idx`.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_bytes(self.txid.as_bytes());
        writer.write_u32_le(self.out_idx);
    }
}

/// What a signer needs to know about the output being spent.
///
/// Exactly one of `output_script` and `redeem_script` should be set: the
/// locking script for bare outputs, or the redeem script for P2SH outputs
/// (whose locking script is derived from it).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SignData {
    /// Value of the spent output in satoshis.
    pub value: u64,
    /// Locking script of the spent output.
    pub output_script: Option<Script>,
    /// Redeem script of a spent P2SH output.
    pub redeem_script: Option<Script>,
}

impl SignData {
    /// Sign data for a bare output.
    pub fn with_output_script(value: u64, output_script: Script) -> Self {
        SignData {
            value,
            output_script: Some(output_script),
            redeem_script: None,
        }
    }

    /// Sign data for a P2SH output.
    pub fn with_redeem_script(value: u64, redeem_script: Script) -> Self {
        SignData {
            value,
            output_script: None,
            redeem_script: Some(redeem_script),
        }
    }
}

/// A transaction input.
///
/// # Wire format
///
/// | Field         | Size          |
/// |---------------|---------------|
/// | txid          | 32 bytes      |
/// | out_idx       | 4 bytes (LE)  |
/// | script length | VarSize       |
/// | script        | variable      |
/// | sequence      | 4 bytes (LE)  |
///
/// `sign_data` is local-only and never serialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    /// The output being spent.
    pub prev_out: OutPoint,
    /// Unlocking script; `None` serializes as an empty script.
    pub script: Option<Script>,
    /// Sequence number.
    pub sequence: u32,
    /// Value and script of the spent output, used for signing.
    pub sign_data: Option<SignData>,
}

impl TxInput {
    /// An unsigned input spending `prev_out` with the default sequence.
    pub fn new(prev_out: OutPoint) -> Self {
        TxInput {
            prev_out,
            script: None,
            sequence: DEFAULT_SEQUENCE,
            sign_data: None,
        }
    }

    /// Attach sign data.
    pub fn with_sign_data(mut self, sign_data: SignData) -> Self {
        self.sign_data = Some(sign_data);
        self
    }

    /// Read an input from `reader`.
    ///
    /// An empty unlocking script is read back as `Some(empty)` so the input
    /// re-serializes identically.
    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, TransactionError> {
        let txid = reader
            .read_array::<32>()
            .map_err(|e| TransactionError::Serialization(format!("reading prev txid: {}", e)))?;
        let out_idx = reader
            .read_u32_le()
            .map_err(|e| TransactionError::Serialization(format!("reading out index: {}", e)))?;
        let script = reader.read_varsize_bytes().map_err(|e| {
            TransactionError::Serialization(format!("reading unlocking script: {}", e))
        })?;
        let sequence = reader
            .read_u32_le()
            .map_err(|e| TransactionError::Serialization(format!("reading sequence: {}", e)))?;
        Ok(TxInput {
            prev_out: OutPoint {
                txid: TxId::new(txid),
                out_idx,
            },
            script: Some(Script::from_bytes(script)),
            sequence,
            sign_data: None,
        })
    }

    /// Write the input in wire format.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        self.prev_out.write_to(writer);
        match &self.script {
            Some(script) => script.write_with_size(writer),
            None => writer.write_u8(0),
        }
        writer.write_u32_le(self.sequence);
    }

    /// Number of bytes `write_to` produces.
    pub fn ser_size(&self) -> usize {
        let script_size = self.script.as_ref().map_or(1, Script::ser_size);
        32 + 4 + script_size + 4
    }
}
