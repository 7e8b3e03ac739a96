//! Big-endian field primitives carrying the stream version so record codecs
//! can gate optional fields.

use bytes::{Buf, BufMut, BytesMut};

use super::version::SaveVersion;
use crate::error::{LinkGraphError, Result};

/// Append-only output stream for one chunk or record.
pub struct SaveWriter {
    buf: BytesMut,
    version: SaveVersion,
}

impl SaveWriter {
    /// Creates an empty stream written at `version`.
    pub fn new(version: SaveVersion) -> Self {
        Self {
            buf: BytesMut::new(),
            version,
        }
    }

    /// Version the stream is written at.
    pub fn version(&self) -> SaveVersion {
        self.version
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Writes one byte.
    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    /// Writes a big-endian `u16`.
    pub fn put_u16(&mut self, v: u16) {
        self.buf.put_u16(v);
    }

    /// Writes a big-endian `u32`.
    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    /// Writes a big-endian `i32`.
    pub fn put_i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    /// Writes a big-endian `u64`.
    pub fn put_u64(&mut self, v: u64) {
        self.buf.put_u64(v);
    }

    /// Writes `len` zero bytes for a field that no longer carries data.
    pub fn put_null(&mut self, len: usize) {
        self.buf.put_bytes(0, len);
    }

    /// Writes raw bytes.
    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Writes a `u32` length prefix followed by `bytes`.
    pub fn put_len_prefixed(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| LinkGraphError::invalid("record larger than u32::MAX bytes"))?;
        self.put_u32(len);
        self.put_slice(bytes);
        Ok(())
    }
}

/// Bounds-checked input stream over one chunk or record.
pub struct SaveReader<'a> {
    buf: &'a [u8],
    version: SaveVersion,
}

impl<'a> SaveReader<'a> {
    /// Reads `buf` as a stream of `version`.
    pub fn new(buf: &'a [u8], version: SaveVersion) -> Self {
        Self { buf, version }
    }

    /// Version of the stream.
    pub fn version(&self) -> SaveVersion {
        self.version
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, len: usize) -> Result<()> {
        if self.buf.remaining() < len {
            return Err(LinkGraphError::corrupt("unexpected end of chunk"));
        }
        Ok(())
    }

    /// Reads one byte.
    pub fn get_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    /// Reads a big-endian `u16`.
    pub fn get_u16(&mut self) -> Result<u16> {
        self.need(2)?;
        Ok(self.buf.get_u16())
    }

    /// Reads a big-endian `u32`.
    pub fn get_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    /// Reads a big-endian `i32`.
    pub fn get_i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    /// Reads a big-endian `u64`.
    pub fn get_u64(&mut self) -> Result<u64> {
        self.need(8)?;
        Ok(self.buf.get_u64())
    }

    /// Skips a field that no longer carries data.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.need(len)?;
        self.buf.advance(len);
        Ok(())
    }

    /// Borrows the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.need(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Reads a `u32` length prefix and borrows that many bytes.
    pub fn take_len_prefixed(&mut self) -> Result<&'a [u8]> {
        let len = self.get_u32()? as usize;
        self.take(len)
    }

    /// Fails if bytes are left over after a record was decoded.
    pub fn ensure_consumed(&self, what: &str) -> Result<()> {
        if self.buf.has_remaining() {
            return Err(LinkGraphError::corrupt(format!(
                "{} trailing bytes after {what}",
                self.buf.remaining()
            )));
        }
        Ok(())
    }
}
