//! Little-endian wire encoding helpers.
//!
//! `VarInt` is the compact-size length prefix; `WireReader` and
//! `WireWriter` walk and build the serialized forms of transactions,
//! block headers and partial merkle trees.

use crate::chainhash::{Hash, HASH_SIZE};
use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// VarInt
// ---------------------------------------------------------------------------

/// A compact-size integer: 1, 3, 5 or 9 bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Encoded length in bytes.
    pub fn length(&self) -> usize {
        if self.0 < 0xfd {
            1
        } else if self.0 <= 0xffff {
            3
        } else if self.0 <= 0xffff_ffff {
            5
        } else {
            9
        }
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let v = self.0;
        let mut buf = Vec::with_capacity(self.length());
        if v < 0xfd {
            buf.push(v as u8);
        } else if v <= 0xffff {
            buf.push(0xfd);
            buf.extend_from_slice(&(v as u16).to_le_bytes());
        } else if v <= 0xffff_ffff {
            buf.push(0xfe);
            buf.extend_from_slice(&(v as u32).to_le_bytes());
        } else {
            buf.push(0xff);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    /// The wrapped value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<usize> for VarInt {
    fn from(v: usize) -> Self {
        VarInt(v as u64)
    }
}

fn minimal(value: u64, shorter_max: u64) -> Result<u64, PrimitivesError> {
    if value <= shorter_max {
        return Err(PrimitivesError::NonCanonicalVarInt(value));
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// WireReader
// ---------------------------------------------------------------------------

/// Cursor over a borrowed byte slice.
///
/// Every read either consumes exactly the bytes it needs or fails with
/// [`PrimitivesError::UnexpectedEof`] and leaves the cursor untouched.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        WireReader { data, pos: 0 }
    }

    /// Read `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        if n > self.remaining() {
            return Err(PrimitivesError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, PrimitivesError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, PrimitivesError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a compact-size integer.
    ///
    /// Only the minimal encoding of a value is accepted, so every decoded
    /// varint re-encodes to the bytes it came from.
    pub fn read_varint(&mut self) -> Result<VarInt, PrimitivesError> {
        let start = self.pos;
        let value = match self.read_u8()? {
            0xff => self.read_u64_le().and_then(|v| minimal(v, 0xffff_ffff)),
            0xfe => self.read_u32_le().and_then(|v| minimal(u64::from(v), 0xffff)),
            0xfd => self.read_u16_le().and_then(|v| minimal(u64::from(v), 0xfc)),
            b => Ok(u64::from(b)),
        };
        value.map(VarInt).map_err(|e| {
            self.pos = start;
            e
        })
    }

    /// Read a compact-size count that must not exceed the bytes left.
    ///
    /// Every counted element occupies at least one byte, so a larger count
    /// can only come from a truncated or hostile stream.
    pub fn read_count(&mut self) -> Result<usize, PrimitivesError> {
        let n = self.read_varint()?.value();
        if n > self.remaining() as u64 {
            return Err(PrimitivesError::OversizedLength(n));
        }
        Ok(n as usize)
    }

    /// Read a compact-size length followed by that many bytes.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], PrimitivesError> {
        let n = self.read_count()?;
        self.read_bytes(n)
    }

    /// Read 32 bytes as a Hash in internal order.
    pub fn read_hash(&mut self) -> Result<Hash, PrimitivesError> {
        Ok(Hash::new(self.read_array::<HASH_SIZE>()?))
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

// ---------------------------------------------------------------------------
// WireWriter
// ---------------------------------------------------------------------------

/// Growable output buffer for wire encoding.
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        WireWriter { buf: Vec::with_capacity(capacity) }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_i32_le(&mut self, val: i32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_varint(&mut self, varint: VarInt) {
        self.buf.extend_from_slice(&varint.to_bytes());
    }

    /// Write a compact-size length followed by the bytes.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(VarInt::from(bytes.len()));
        self.write_bytes(bytes);
    }

    /// Write a Hash in internal order.
    pub fn write_hash(&mut self, hash: &Hash) {
        self.write_bytes(hash.as_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
