//! Script operations.
//!
//! An [`Op`] is either a bare opcode or a data push. Push opcodes are
//! validated against their payload on construction, so a script built from
//! ops always has length prefixes that match the bytes that follow them.

use ecash_primitives::util::{ByteReader, ByteWriter};

use crate::opcodes::*;
use crate::ScriptError;

/// A single script operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// A non-push opcode such as `OP_CHECKSIG`.
    Code(u8),
    /// A data push with its push opcode.
    Push(PushOp),
}

/// A data push together with the opcode that frames it.
///
/// Direct pushes (0x00..=0x4b) use the length as the opcode; longer
/// payloads use OP_PUSHDATA1/2/4. Non-minimal framings (e.g. an empty
/// payload behind OP_PUSHDATA1) are allowed as long as the length fits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushOp {
    opcode: u8,
    data: Vec<u8>,
}

impl PushOp {
    /// Frame `data` with an explicit push opcode.
    ///
    /// # Returns
    /// `Err(PushLengthMismatch)` if `opcode` is a direct push of a different
    /// length, a PUSHDATA opcode too small for the payload, or not a push
    /// opcode at all.
    pub fn new(opcode: u8, data: Vec<u8>) -> Result<Self, ScriptError> {
        let len = data.len();
        let fits = match opcode {
            0x00..=0x4b => len == opcode as usize,
            OP_PUSHDATA1 => len <= 0xff,
            OP_PUSHDATA2 => len <= 0xffff,
            OP_PUSHDATA4 => len as u64 <= 0xffff_ffff,
            _ => false,
        };
        if !fits {
            return Err(ScriptError::PushLengthMismatch { opcode, len });
        }
        Ok(PushOp { opcode, data })
    }

    /// The push opcode.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// The pushed payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the pushed payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl Op {
    /// The opcode byte that starts this op.
    pub fn opcode(&self) -> u8 {
        match self {
            Op::Code(opcode) => *opcode,
            Op::Push(push) => push.opcode,
        }
    }

    /// The payload if this op is a push.
    pub fn push_data(&self) -> Option<&[u8]> {
        match self {
            Op::Code(_) => None,
            Op::Push(push) => Some(&push.data),
        }
    }

    /// Serialize this op.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        match self {
            Op::Code(opcode) => writer.write_u8(*opcode),
            Op::Push(push) => {
                writer.write_u8(push.opcode);
                match push.opcode {
                    OP_PUSHDATA1 => writer.write_u8(push.data.len() as u8),
                    OP_PUSHDATA2 => writer.write_u16_le(push.data.len() as u16),
                    OP_PUSHDATA4 => writer.write_u32_le(push.data.len() as u32),
                    _ => {}
                }
                writer.write_bytes(&push.data);
            }
        }
    }

    /// Number of bytes `write_to` produces.
    pub fn ser_size(&self) -> usize {
        match self {
            Op::Code(_) => 1,
            Op::Push(push) => {
                let prefix = match push.opcode {
                    OP_PUSHDATA1 => 2,
                    OP_PUSHDATA2 => 3,
                    OP_PUSHDATA4 => 5,
                    _ => 1,
                };
                prefix + push.data.len()
            }
        }
    }

    /// Render as an ASM token: hex for pushes, the opcode name otherwise.
    pub fn to_asm_string(&self) -> String {
        match self {
            Op::Code(opcode) => opcode_name(*opcode),
            Op::Push(push) if push.data.is_empty() => opcode_name(push.opcode),
            Op::Push(push) => hex::encode(&push.data),
        }
    }
}

impl From<u8> for Op {
    fn from(opcode: u8) -> Self {
        Op::Code(opcode)
    }
}

/// Push `data` with the smallest framing that fits its length.
///
/// An empty payload becomes `OP_0`.
pub fn push_bytes_op(data: impl Into<Vec<u8>>) -> Op {
    let data = data.into();
    let opcode = match data.len() {
        len @ 0..=0x4b => len as u8,
        0x4c..=0xff => OP_PUSHDATA1,
        0x100..=0xffff => OP_PUSHDATA2,
        _ => OP_PUSHDATA4,
    };
    Op::Push(PushOp { opcode, data })
}

/// Push an integer the way script numbers are minimally encoded.
///
/// 0 and 1..=16 use their dedicated opcodes, -1 uses `OP_1NEGATE`, and
/// everything else is a little-endian sign-magnitude push.
pub fn push_number_op(n: i64) -> Op {
    match n {
        0 => push_bytes_op(Vec::new()),
        -1 => Op::Code(OP_1NEGATE),
        1..=16 => Op::Code(OP_1 + (n as u8) - 1),
        _ => {
            let negative = n < 0;
            let mut abs = n.unsigned_abs();
            let mut bytes = Vec::with_capacity(9);
            while abs > 0 {
                bytes.push((abs & 0xff) as u8);
                abs >>= 8;
            }
            let last = bytes.len() - 1;
            if bytes[last] & 0x80 != 0 {
                bytes.push(if negative { 0x80 } else { 0x00 });
            } else if negative {
                bytes[last] |= 0x80;
            }
            push_bytes_op(bytes)
        }
    }
}

/// Read one op from `reader`.
///
/// # Returns
/// The decoded op, or `DataTooSmall` if a push runs past the end.
pub fn read_op(reader: &mut ByteReader<'_>) -> Result<Op, ScriptError> {
    let opcode = reader.read_u8().map_err(|_| ScriptError::DataTooSmall)?;
    let len = match opcode {
        0x00..=0x4b => opcode as usize,
        OP_PUSHDATA1 => reader.read_u8().map_err(|_| ScriptError::DataTooSmall)? as usize,
        OP_PUSHDATA2 => reader.read_u16_le().map_err(|_| ScriptError::DataTooSmall)? as usize,
        OP_PUSHDATA4 => reader.read_u32_le().map_err(|_| ScriptError::DataTooSmall)? as usize,
        _ => return Ok(Op::Code(opcode)),
    };
    let data = reader.read_bytes(len).map_err(|_| ScriptError::DataTooSmall)?;
    Ok(Op::Push(PushOp {
        opcode,
        data: data.to_vec(),
    }))
}

/// Iterator over the ops of a script.
///
/// Yields `Err` once on a truncated push and then stops.
pub struct OpIter<'a> {
    reader: ByteReader<'a>,
    failed: bool,
}

impl<'a> OpIter<'a> {
    /// Iterate over the ops encoded in `bytecode`.
    pub fn new(bytecode: &'a [u8]) -> Self {
        OpIter {
            reader: ByteReader::new(bytecode),
            failed: false,
        }
    }

    /// Byte offset of the next op.
    pub fn position(&self) -> usize {
        self.reader.position()
    }
}

impl Iterator for OpIter<'_> {
    type Item = Result<Op, ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.remaining() == 0 {
            return None;
        }
        let op = read_op(&mut self.reader);
        self.failed = op.is_err();
        Some(op)
    }
}
