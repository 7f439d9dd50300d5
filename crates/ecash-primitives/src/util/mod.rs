//! Binary serialization helpers.
//!
//! `VarSize` is the compact-size integer that prefixes every list and
//! script in a serialized transaction. `ByteReader` and `ByteWriter` walk
//! and build the little-endian wire format; the writer also carries the
//! big-endian and 48-bit encodings used by token sections.

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// VarSize
// ---------------------------------------------------------------------------

/// A compact-size integer.
///
/// Encoded in 1 byte below 0xfd, otherwise as a marker byte (0xfd, 0xfe,
/// 0xff) followed by a 2, 4 or 8 byte little-endian value. The width change
/// at 253 is visible in transaction sizes: 252 outputs take one prefix byte,
/// 253 outputs take three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VarSize(pub u64);

impl VarSize {
    /// Return the encoded byte length: 1, 3, 5 or 9.
    pub fn length(&self) -> usize {
        match self.0 {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x1_0000..=0xffff_ffff => 5,
            _ => 9,
        }
    }

    /// Encode into a new byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.length());
        writer.write_varsize(*self);
        writer.into_bytes()
    }

    /// Return the underlying integer.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VarSize {
    fn from(v: u64) -> Self {
        VarSize(v)
    }
}

impl From<usize> for VarSize {
    fn from(v: usize) -> Self {
        VarSize(v as u64)
    }
}

// ---------------------------------------------------------------------------
// ByteReader
// ---------------------------------------------------------------------------

/// A cursor over a byte slice.
///
/// Every read either consumes exactly the requested bytes or fails with
/// `PrimitivesError::UnexpectedEof` without advancing.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// Read `n` bytes and advance past them.
    ///
    /// # Arguments
    /// * `n` - Number of bytes to read.
    ///
    /// # Returns
    /// A slice borrowed from the underlying data, or `UnexpectedEof`.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(PrimitivesError::UnexpectedEof)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.read_bytes(N)?);
        Ok(arr)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian u16.
    pub fn read_u16_le(&mut self) -> Result<u16, PrimitivesError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64.
    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a compact-size integer.
    ///
    /// Non-minimal encodings are accepted; the value is what counts.
    pub fn read_varsize(&mut self) -> Result<VarSize, PrimitivesError> {
        let value = match self.read_u8()? {
            0xfd => self.read_u16_le()? as u64,
            0xfe => self.read_u32_le()? as u64,
            0xff => self.read_u64_le()?,
            b => b as u64,
        };
        Ok(VarSize(value))
    }

    /// Read a varsize length followed by that many bytes.
    pub fn read_varsize_bytes(&mut self) -> Result<&'a [u8], PrimitivesError> {
        let len = self.read_varsize()?.value();
        let len = usize::try_from(len).map_err(|_| PrimitivesError::VarSizeTooLarge)?;
        self.read_bytes(len)
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }
}

// ---------------------------------------------------------------------------
// ByteWriter
// ---------------------------------------------------------------------------

/// An append-only byte buffer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    /// Create an empty writer with `capacity` bytes preallocated.
    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Append a little-endian u16.
    pub fn write_u16_le(&mut self, val: u16) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u32.
    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u64.
    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a big-endian u64, the atom encoding of SLP.
    pub fn write_u64_be(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Append the low 48 bits of `val` in little-endian order.
    ///
    /// # Returns
    /// `Err(PrimitivesError::ValueOutOfRange)` if `val` does not fit in 48 bits.
    pub fn write_u48_le(&mut self, val: u64) -> Result<(), PrimitivesError> {
        if val > MAX_U48 {
            return Err(PrimitivesError::ValueOutOfRange(val.to_string()));
        }
        self.buf.extend_from_slice(&val.to_le_bytes()[..6]);
        Ok(())
    }

    /// Append a compact-size integer.
    pub fn write_varsize(&mut self, size: VarSize) {
        let v = size.0;
        match size.length() {
            1 => self.write_u8(v as u8),
            3 => {
                self.write_u8(0xfd);
                self.write_u16_le(v as u16);
            }
            5 => {
                self.write_u8(0xfe);
                self.write_u32_le(v as u32);
            }
            _ => {
                self.write_u8(0xff);
                self.write_u64_le(v);
            }
        }
    }

    /// Append a varsize length prefix followed by `bytes`.
    pub fn write_varsize_bytes(&mut self, bytes: &[u8]) {
        self.write_varsize(VarSize::from(bytes.len()));
        self.write_bytes(bytes);
    }

    /// Consume the writer and return its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Borrow the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Largest value representable in 48 bits.
pub const MAX_U48: u64 = 0xffff_ffff_ffff;
