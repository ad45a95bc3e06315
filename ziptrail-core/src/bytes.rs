//! Little-endian primitive readers.
//!
//! Every multi-byte integer in a ZIP archive is little-endian. [`LeRead`]
//! extends any [`Read`] with fixed-width decoders that read at the current
//! position; a short read surfaces as an I/O error of kind `UnexpectedEof`.
//!
//! [`LeSlice`] does the same for an in-memory field buffer (extra fields are
//! read whole and then walked), failing with a malformed-archive error when
//! a field runs past the end of its chunk.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Result, ZipError};

/// Little-endian decoding on top of [`Read`].
pub trait LeRead: Read {
    /// Read one byte.
    fn le_u8(&mut self) -> Result<u8> {
        Ok(self.read_u8()?)
    }

    /// Read a 16-bit little-endian integer.
    fn le_u16(&mut self) -> Result<u16> {
        Ok(self.read_u16::<LittleEndian>()?)
    }

    /// Read a 32-bit little-endian integer.
    fn le_u32(&mut self) -> Result<u32> {
        Ok(self.read_u32::<LittleEndian>()?)
    }

    /// Read a 64-bit little-endian integer.
    fn le_u64(&mut self) -> Result<u64> {
        Ok(self.read_u64::<LittleEndian>()?)
    }

    /// Read exactly `len` bytes into a new vector.
    fn le_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a 32-bit signature and check it against `expected`.
    fn expect_signature(&mut self, structure: &'static str, expected: u32) -> Result<()> {
        let found = self.le_u32()?;
        if found != expected {
            return Err(ZipError::invalid_magic(structure, expected, found));
        }
        Ok(())
    }
}

impl<R: Read + ?Sized> LeRead for R {}

/// Bounds-checked little-endian cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct LeSlice<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> LeSlice<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Take the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(ZipError::malformed(format!(
                "field of {} bytes overruns buffer ({} bytes left)",
                len,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a 32-bit little-endian integer.
    pub fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a 64-bit little-endian integer.
    pub fn u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(u64::from_le_bytes(raw))
    }
}
