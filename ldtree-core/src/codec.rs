//! Little-endian binary codec shared by table and tree persistence
//!
//! ## Wire Primitives
//!
//! ```text
//! u8      1 byte
//! u32     4 bytes, little-endian
//! i32     4 bytes, little-endian, two's complement
//! string  u32 byte length, then UTF-8 bytes
//! [i32]   u32 element count, then the elements
//! [u32]   u32 element count, then the elements
//! ```
//!
//! Readers never trust a length prefix: before allocating, the prefix is
//! checked against the bytes actually left in the input, so a corrupt file
//! fails with `UnexpectedEof` instead of a huge allocation.

use alloc::string::String;
use alloc::vec::Vec;

use crate::errors::{CodecError, CodecResult};

/// Append-only byte sink
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Write a single byte
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write an unsigned 32-bit integer
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a signed 32-bit integer
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a length as u32, saturating lengths that do not fit
    pub fn write_len(&mut self, len: usize) {
        self.write_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }

    /// Write a length-prefixed UTF-8 string
    pub fn write_str(&mut self, value: &str) {
        self.write_len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Write a length-prefixed `i32` array
    pub fn write_i32_slice(&mut self, values: &[i32]) {
        self.write_len(values.len());
        for &value in values {
            self.write_i32(value);
        }
    }

    /// Write a length-prefixed `u32` array
    pub fn write_u32_slice(&mut self, values: &[u32]) {
        self.write_len(values.len());
        for &value in values {
            self.write_u32(value);
        }
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an encoded byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at the beginning of `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Whether the whole input has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, needed: usize) -> CodecResult<&'a [u8]> {
        let available = self.remaining();
        if needed > available {
            return Err(CodecError::UnexpectedEof { needed, available });
        }
        let slice = &self.bytes[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Read an unsigned 32-bit integer
    pub fn read_u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.take_array::<4>()?))
    }

    /// Read a signed 32-bit integer
    pub fn read_i32(&mut self) -> CodecResult<i32> {
        Ok(i32::from_le_bytes(self.take_array::<4>()?))
    }

    /// Read a length prefix, checking that `item_size * len` bytes remain
    pub fn read_len(&mut self, item_size: usize) -> CodecResult<usize> {
        let len = self.read_u32()? as usize;
        let needed = len.saturating_mul(item_size);
        let available = self.remaining();
        if needed > available {
            return Err(CodecError::UnexpectedEof { needed, available });
        }
        Ok(len)
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_string(&mut self) -> CodecResult<String> {
        let len = self.read_len(1)?;
        let raw = self.take(len)?;
        core::str::from_utf8(raw)
            .map(String::from)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    /// Read a length-prefixed `i32` array
    pub fn read_i32_vec(&mut self) -> CodecResult<Vec<i32>> {
        let len = self.read_len(4)?;
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(self.read_i32()?);
        }
        Ok(values)
    }

    /// Read a length-prefixed `u32` array
    pub fn read_u32_vec(&mut self) -> CodecResult<Vec<u32>> {
        let len = self.read_len(4)?;
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(self.read_u32()?);
        }
        Ok(values)
    }
}
