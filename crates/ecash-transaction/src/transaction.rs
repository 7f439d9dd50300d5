//! The transaction model.
//!
//! A `Tx` is a version, ordered inputs, ordered outputs and a locktime.
//! Serialization follows the network wire format; `ser_size` computes the
//! exact length without allocating the bytes.

use std::fmt;

use ecash_primitives::util::{ByteReader, ByteWriter, VarSize};

use crate::input::TxInput;
use crate::output::TxOutput;
use crate::txid::TxId;
use crate::TransactionError;

/// Default transaction version.
pub const DEFAULT_TX_VERSION: u32 = 2;

/// An eCash transaction.
///
/// # Wire format
///
/// | Field        | Size                  |
/// |--------------|-----------------------|
/// | version      | 4 bytes (LE)          |
/// | input count  | VarSize               |
/// | inputs       | variable (per input)  |
/// | output count | VarSize               |
/// | outputs      | variable (per output) |
/// | locktime     | 4 bytes (LE)          |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tx {
    /// Transaction format version.
    pub version: u32,
    /// Ordered inputs.
    pub inputs: Vec<TxInput>,
    /// Ordered outputs.
    pub outputs: Vec<TxOutput>,
    /// Block height or timestamp before which the tx is invalid.
    pub locktime: u32,
}

impl Tx {
    /// An empty transaction with the default version and locktime 0.
    pub fn new() -> Self {
        Tx {
            version: DEFAULT_TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            locktime: 0,
        }
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Write the transaction in wire format.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u32_le(self.version);
        writer.write_varsize(VarSize::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(writer);
        }
        writer.write_varsize(VarSize::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(writer);
        }
        writer.write_u32_le(self.locktime);
    }

    /// Serialize to bytes.
    pub fn ser(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.ser_size());
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Exact serialized length in bytes.
    pub fn ser_size(&self) -> usize {
        4 + VarSize::from(self.inputs.len()).length()
            + self.inputs.iter().map(TxInput::ser_size).sum::<usize>()
            + VarSize::from(self.outputs.len()).length()
            + self.outputs.iter().map(TxOutput::ser_size).sum::<usize>()
            + 4
    }

    /// Serialize to lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.ser())
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a transaction that spans all of `bytes`.
    ///
    /// # Returns
    /// The transaction, or `Serialization` for truncated data or trailing
    /// bytes.
    pub fn deser(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = ByteReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::Serialization(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Parse a hex-encoded transaction.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::Serialization(format!("invalid hex: {}", e)))?;
        Self::deser(&bytes)
    }

    /// Read one transaction from `reader`.
    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, TransactionError> {
        let version = reader
            .read_u32_le()
            .map_err(|e| TransactionError::Serialization(format!("reading version: {}", e)))?;

        let num_inputs = read_count(reader, "input count")?;
        let mut inputs = Vec::with_capacity(num_inputs.min(reader.remaining() / 41));
        for _ in 0..num_inputs {
            inputs.push(TxInput::read_from(reader)?);
        }

        let num_outputs = read_count(reader, "output count")?;
        let mut outputs = Vec::with_capacity(num_outputs.min(reader.remaining() / 9));
        for _ in 0..num_outputs {
            outputs.push(TxOutput::read_from(reader)?);
        }

        let locktime = reader
            .read_u32_le()
            .map_err(|e| TransactionError::Serialization(format!("reading locktime: {}", e)))?;

        Ok(Tx {
            version,
            inputs,
            outputs,
            locktime,
        })
    }

    // -----------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------

    /// sha256d of the serialized transaction.
    pub fn txid(&self) -> TxId {
        TxId::from_tx_bytes(&self.ser())
    }
}

fn read_count(reader: &mut ByteReader<'_>, what: &str) -> Result<usize, TransactionError> {
    let count = reader
        .read_varsize()
        .map_err(|e| TransactionError::Serialization(format!("reading {}: {}", what, e)))?;
    usize::try_from(count.value())
        .map_err(|_| TransactionError::Serialization(format!("{} too large", what)))
}

impl Default for Tx {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Tx {
    /// Display the transaction as its hex serialization.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
