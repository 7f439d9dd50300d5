//! Signature hash types and preimage serialization.
//!
//! Two digest algorithms exist. BIP143 (selected by the `0x40` fork flag)
//! commits to the spent value and caches whole-transaction hashes. The
//! legacy algorithm re-serializes a modified copy of the transaction for
//! every input.
//!
//! Both are driven from [`crate::unsigned_tx::UnsignedTxInput::sig_hash_preimage`],
//! which resolves the script code and then calls into this module.

use std::fmt;

use ecash_primitives::hash::sha256d;
use ecash_primitives::util::{ByteWriter, VarSize};
use ecash_script::Script;

use crate::unsigned_tx::UnsignedTx;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash type
// -----------------------------------------------------------------------

/// Fork flag selecting the BIP143 digest.
pub const SIGHASH_FORKID: u32 = 0x40;

/// Flag committing to the signing input only.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Which outputs a signature commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SigHashOutputs {
    /// Every output.
    All,
    /// No outputs.
    None,
    /// The output at the signing input's index.
    Single,
}

impl SigHashOutputs {
    fn base_flag(self) -> u32 {
        match self {
            SigHashOutputs::All => 0x01,
            SigHashOutputs::None => 0x02,
            SigHashOutputs::Single => 0x03,
        }
    }
}

/// A signature hash type.
///
/// Exactly one output mode is active; ANYONECANPAY and the digest
/// algorithm are independent flags on top of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SigHashType {
    /// Which outputs are committed to.
    pub outputs: SigHashOutputs,
    /// Whether only the signing input is committed to.
    pub anyone_can_pay: bool,
    /// BIP143 digest if set, legacy digest otherwise.
    pub bip143: bool,
}

impl SigHashType {
    /// `ALL | FORKID`, the default for new signatures.
    pub const ALL_BIP143: SigHashType = SigHashType::new(SigHashOutputs::All, false, true);
    /// `NONE | FORKID`.
    pub const NONE_BIP143: SigHashType = SigHashType::new(SigHashOutputs::None, false, true);
    /// `SINGLE | FORKID`.
    pub const SINGLE_BIP143: SigHashType = SigHashType::new(SigHashOutputs::Single, false, true);
    /// `ALL | FORKID | ANYONECANPAY`.
    pub const ALL_ANYONECANPAY_BIP143: SigHashType =
        SigHashType::new(SigHashOutputs::All, true, true);
    /// `NONE | FORKID | ANYONECANPAY`.
    pub const NONE_ANYONECANPAY_BIP143: SigHashType =
        SigHashType::new(SigHashOutputs::None, true, true);
    /// `SINGLE | FORKID | ANYONECANPAY`.
    pub const SINGLE_ANYONECANPAY_BIP143: SigHashType =
        SigHashType::new(SigHashOutputs::Single, true, true);
    /// Legacy `ALL`.
    pub const ALL_LEGACY: SigHashType = SigHashType::new(SigHashOutputs::All, false, false);
    /// Legacy `NONE`.
    pub const NONE_LEGACY: SigHashType = SigHashType::new(SigHashOutputs::None, false, false);
    /// Legacy `SINGLE`.
    pub const SINGLE_LEGACY: SigHashType = SigHashType::new(SigHashOutputs::Single, false, false);
    /// Legacy `ALL | ANYONECANPAY`.
    pub const ALL_ANYONECANPAY_LEGACY: SigHashType =
        SigHashType::new(SigHashOutputs::All, true, false);
    /// Legacy `NONE | ANYONECANPAY`.
    pub const NONE_ANYONECANPAY_LEGACY: SigHashType =
        SigHashType::new(SigHashOutputs::None, true, false);
    /// Legacy `SINGLE | ANYONECANPAY`.
    pub const SINGLE_ANYONECANPAY_LEGACY: SigHashType =
        SigHashType::new(SigHashOutputs::Single, true, false);

    /// Combine an output mode with the two flags.
    pub const fn new(outputs: SigHashOutputs, anyone_can_pay: bool, bip143: bool) -> Self {
        SigHashType {
            outputs,
            anyone_can_pay,
            bip143,
        }
    }

    /// The 32-bit value appended to preimages.
    pub fn to_u32(self) -> u32 {
        let mut flags = self.outputs.base_flag();
        if self.bip143 {
            flags |= SIGHASH_FORKID;
        }
        if self.anyone_can_pay {
            flags |= SIGHASH_ANYONECANPAY;
        }
        flags
    }

    /// The byte appended to signatures.
    pub fn to_flag_byte(self) -> u8 {
        self.to_u32() as u8
    }

    /// Parse a 32-bit sighash value.
    ///
    /// # Returns
    /// `None` if the base type is not ALL, NONE or SINGLE, or any bit
    /// outside the known flags is set.
    pub fn from_u32(flags: u32) -> Option<Self> {
        if flags & !(0x03 | SIGHASH_FORKID | SIGHASH_ANYONECANPAY) != 0 {
            return None;
        }
        let outputs = match flags & 0x03 {
            0x01 => SigHashOutputs::All,
            0x02 => SigHashOutputs::None,
            0x03 => SigHashOutputs::Single,
            _ => return None,
        };
        Some(SigHashType {
            outputs,
            anyone_can_pay: flags & SIGHASH_ANYONECANPAY != 0,
            bip143: flags & SIGHASH_FORKID != 0,
        })
    }
}

impl Default for SigHashType {
    fn default() -> Self {
        SigHashType::ALL_BIP143
    }
}

impl fmt::Display for SigHashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.outputs {
            SigHashOutputs::All => "ALL",
            SigHashOutputs::None => "NONE",
            SigHashOutputs::Single => "SINGLE",
        };
        f.write_str(base)?;
        if self.anyone_can_pay {
            f.write_str("_ANYONECANPAY")?;
        }
        f.write_str(if self.bip143 { "_BIP143" } else { "_LEGACY" })
    }
}

// -----------------------------------------------------------------------
// Preimage
// -----------------------------------------------------------------------

/// The bytes a signature commits to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preimage {
    /// Serialized preimage; sign `sha256d(bytes)`.
    pub bytes: Vec<u8>,
    /// The script code committed to, after OP_CODESEPARATOR cutting.
    pub script_code: Script,
    /// The full script the script code was cut from.
    pub redeem_script: Script,
}

impl Preimage {
    /// sha256d of the preimage bytes.
    pub fn sig_hash(&self) -> [u8; 32] {
        sha256d(&self.bytes)
    }
}

// -----------------------------------------------------------------------
// Digest algorithms
// -----------------------------------------------------------------------

/// Serialize the BIP143 preimage of input `input_idx`.
///
/// Whole-transaction hashes come from the caches on `unsigned_tx`.
///
/// # Arguments
/// * `unsigned_tx` - The transaction with cached hashes.
/// * `input_idx`   - Index of the signing input (must be in range).
/// * `script_code` - Script code after OP_CODESEPARATOR cutting.
/// * `value`       - Value of the spent output.
/// * `sig_hash_type` - Must have `bip143` set.
pub(crate) fn bip143_preimage(
    unsigned_tx: &UnsignedTx,
    input_idx: usize,
    script_code: &Script,
    value: u64,
    sig_hash_type: SigHashType,
) -> Vec<u8> {
    let tx = unsigned_tx.tx();
    let input = &tx.inputs[input_idx];

    let zero = [0u8; 32];
    let hash_prevouts = if sig_hash_type.anyone_can_pay {
        zero
    } else {
        unsigned_tx.prevouts_hash
    };
    let hash_sequence =
        if sig_hash_type.anyone_can_pay || sig_hash_type.outputs != SigHashOutputs::All {
            zero
        } else {
            unsigned_tx.sequences_hash
        };
    let hash_outputs = match sig_hash_type.outputs {
        SigHashOutputs::All => unsigned_tx.outputs_hash,
        SigHashOutputs::Single => match tx.outputs.get(input_idx) {
            Some(output) => {
                let mut writer = ByteWriter::with_capacity(output.ser_size());
                output.write_to(&mut writer);
                sha256d(writer.as_bytes())
            }
            None => zero,
        },
        SigHashOutputs::None => zero,
    };

    let mut writer = ByteWriter::with_capacity(156 + script_code.len());
    writer.write_u32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    input.prev_out.write_to(&mut writer);
    script_code.write_with_size(&mut writer);
    writer.write_u64_le(value);
    writer.write_u32_le(input.sequence);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.locktime);
    writer.write_u32_le(sig_hash_type.to_u32());
    writer.into_bytes()
}

/// Serialize the legacy preimage of input `input_idx`.
///
/// `script_code` must already be stripped of OP_CODESEPARATORs.
///
/// # Returns
/// The preimage, or `InvalidSigHash` for SINGLE without a matching output.
pub(crate) fn legacy_preimage(
    unsigned_tx: &UnsignedTx,
    input_idx: usize,
    script_code: &Script,
    sig_hash_type: SigHashType,
) -> Result<Vec<u8>, TransactionError> {
    let tx = unsigned_tx.tx();
    let outputs = sig_hash_type.outputs;
    if outputs == SigHashOutputs::Single && input_idx >= tx.outputs.len() {
        return Err(TransactionError::InvalidSigHash(
            "Invalid usage of SINGLE, input has no corresponding output".to_string(),
        ));
    }

    let mut writer = ByteWriter::with_capacity(tx.ser_size() + script_code.len());
    writer.write_u32_le(tx.version);

    if sig_hash_type.anyone_can_pay {
        let input = &tx.inputs[input_idx];
        writer.write_varsize(VarSize(1));
        input.prev_out.write_to(&mut writer);
        script_code.write_with_size(&mut writer);
        writer.write_u32_le(input.sequence);
    } else {
        writer.write_varsize(VarSize::from(tx.inputs.len()));
        for (idx, input) in tx.inputs.iter().enumerate() {
            input.prev_out.write_to(&mut writer);
            if idx == input_idx {
                script_code.write_with_size(&mut writer);
                writer.write_u32_le(input.sequence);
            } else {
                writer.write_u8(0);
                let sequence = match outputs {
                    SigHashOutputs::All => input.sequence,
                    SigHashOutputs::None | SigHashOutputs::Single => 0,
                };
                writer.write_u32_le(sequence);
            }
        }
    }

    match outputs {
        SigHashOutputs::All => {
            writer.write_varsize(VarSize::from(tx.outputs.len()));
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
        SigHashOutputs::None => writer.write_varsize(VarSize(0)),
        SigHashOutputs::Single => {
            writer.write_varsize(VarSize::from(input_idx + 1));
            for _ in 0..input_idx {
                writer.write_u64_le(0);
                writer.write_u8(0);
            }
            tx.outputs[input_idx].write_to(&mut writer);
        }
    }

    writer.write_u32_le(tx.locktime);
    writer.write_u32_le(sig_hash_type.to_u32());
    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(SigHashType::ALL_BIP143.to_u32(), 0x41);
        assert_eq!(SigHashType::NONE_BIP143.to_u32(), 0x42);
        assert_eq!(SigHashType::SINGLE_BIP143.to_u32(), 0x43);
        assert_eq!(SigHashType::ALL_ANYONECANPAY_BIP143.to_u32(), 0xc1);
        assert_eq!(SigHashType::SINGLE_ANYONECANPAY_LEGACY.to_u32(), 0x83);
        assert_eq!(SigHashType::ALL_LEGACY.to_flag_byte(), 0x01);
    }

    #[test]
    fn test_from_u32() {
        assert_eq!(SigHashType::from_u32(0x41), Some(SigHashType::ALL_BIP143));
        assert_eq!(SigHashType::from_u32(0x82), Some(SigHashType::NONE_ANYONECANPAY_LEGACY));
        assert_eq!(SigHashType::from_u32(0x40), None);
        assert_eq!(SigHashType::from_u32(0x141), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(SigHashType::ALL_BIP143.to_string(), "ALL_BIP143");
        assert_eq!(
            SigHashType::SINGLE_ANYONECANPAY_LEGACY.to_string(),
            "SINGLE_ANYONECANPAY_LEGACY"
        );
    }
}
