//! Transaction outputs.

use ecash_primitives::util::{ByteReader, ByteWriter};
use ecash_script::Script;

use crate::TransactionError;

/// An output: a value in satoshis locked by a script.
///
/// # Wire format
///
/// | Field         | Size          |
/// |---------------|---------------|
/// | value         | 8 bytes (LE)  |
/// | script length | VarSize       |
/// | script        | variable      |
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TxOutput {
    /// Amount in satoshis.
    pub value: u64,
    /// The locking script.
    pub script: Script,
}

impl TxOutput {
    /// Create an output.
    pub fn new(value: u64, script: Script) -> Self {
        TxOutput { value, script }
    }

    /// Read an output from `reader`.
    ///
    /// # Returns
    /// The output, or `Serialization` if the data is truncated.
    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, TransactionError> {
        let value = reader
            .read_u64_le()
            .map_err(|e| TransactionError::Serialization(format!("reading value: {}", e)))?;
        let script = reader.read_varsize_bytes().map_err(|e| {
            TransactionError::Serialization(format!("reading locking script: {}", e))
        })?;
        Ok(TxOutput {
            value,
            script: Script::from_bytes(script),
        })
    }

    /// Write the output in wire format.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u64_le(self.value);
        self.script.write_with_size(writer);
    }

    /// Number of bytes `write_to` produces.
    pub fn ser_size(&self) -> usize {
        8 + self.script.ser_size()
    }
}
