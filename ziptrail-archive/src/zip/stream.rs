//! Streaming entry reader.
//!
//! An [`EntrySession`] turns the compressed payload of one entry into
//! uncompressed bytes on demand. Each read call loops over three steps:
//!
//! 1. When the staging buffer is drained and compressed bytes remain, refill
//!    it with one bounded read at the tracked stream position, decrypting in
//!    place for encrypted entries.
//! 2. Copy (stored entries and raw mode) or decompress staged bytes into the
//!    caller's buffer.
//! 3. Fold the produced bytes into the running CRC-32.
//!
//! The stream position is tracked explicitly and re-seeked before every
//! refill, so other operations on the archive may move the underlying
//! stream between reads.

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, warn};

use ziptrail_core::crc::Crc32;
use ziptrail_core::error::{Result, ZipError};
use ziptrail_core::traits::{DecompressStatus, Decompressor};

use super::crypto::ZipCrypto;
use super::header::CompressionMethod;

/// State of one open entry.
pub(crate) struct EntrySession {
    name: String,
    method: CompressionMethod,
    raw: bool,
    expected_crc: u32,
    crc: Crc32,
    compressed_remaining: u64,
    uncompressed_remaining: u64,
    total_out: u64,
    /// Absolute stream offset of the next compressed byte to load.
    position: u64,
    buffer: Vec<u8>,
    buf_pos: usize,
    buf_len: usize,
    decoder: Option<Box<dyn Decompressor>>,
    cipher: Option<ZipCrypto>,
    /// Absolute offset and length of the local extra field.
    local_extra_offset: u64,
    local_extra_len: u64,
    local_extra_read: u64,
}

/// Everything needed to start a session.
pub(crate) struct SessionParams {
    pub name: String,
    pub method: CompressionMethod,
    pub raw: bool,
    pub expected_crc: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub payload_position: u64,
    pub buffer_size: usize,
    pub decoder: Option<Box<dyn Decompressor>>,
    pub cipher: Option<ZipCrypto>,
    pub local_extra_offset: u64,
    pub local_extra_len: u16,
}

impl EntrySession {
    pub(crate) fn new(params: SessionParams) -> Self {
        Self {
            name: params.name,
            method: params.method,
            raw: params.raw,
            expected_crc: params.expected_crc,
            crc: Crc32::new(),
            compressed_remaining: params.compressed_size,
            uncompressed_remaining: params.uncompressed_size,
            total_out: 0,
            position: params.payload_position,
            buffer: vec![0u8; params.buffer_size.max(1)],
            buf_pos: 0,
            buf_len: 0,
            decoder: params.decoder,
            cipher: params.cipher,
            local_extra_offset: params.local_extra_offset,
            local_extra_len: params.local_extra_len as u64,
            local_extra_read: 0,
        }
    }

    /// Compressed bytes loaded but not yet consumed.
    fn staged(&self) -> usize {
        self.buf_len - self.buf_pos
    }

    fn refill<R: Read + Seek>(&mut self, reader: &mut R) -> Result<()> {
        let len = (self.buffer.len() as u64).min(self.compressed_remaining) as usize;
        reader.seek(SeekFrom::Start(self.position))?;
        reader.read_exact(&mut self.buffer[..len])?;
        if let Some(cipher) = self.cipher.as_mut() {
            cipher.decrypt_buffer(&mut self.buffer[..len]);
        }
        self.position += len as u64;
        self.compressed_remaining -= len as u64;
        self.buf_pos = 0;
        self.buf_len = len;
        Ok(())
    }

    fn account(&mut self, produced: &[u8]) {
        self.crc.update(produced);
        self.uncompressed_remaining = self
            .uncompressed_remaining
            .saturating_sub(produced.len() as u64);
        self.total_out += produced.len() as u64;
    }

    /// Produce up to `out.len()` bytes; `Ok(0)` means end of entry.
    pub(crate) fn read<R: Read + Seek>(&mut self, reader: &mut R, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        let budget = if self.raw {
            self.compressed_remaining + self.staged() as u64
        } else {
            self.uncompressed_remaining
        };
        let want = (out.len() as u64).min(budget) as usize;
        let passthrough = self.raw || self.method == CompressionMethod::Stored;

        let mut produced = 0;
        while produced < want {
            if self.staged() == 0 && self.compressed_remaining > 0 {
                self.refill(reader)?;
            }

            if passthrough {
                let staged = self.staged();
                if staged == 0 {
                    break;
                }
                let n = (want - produced).min(staged);
                out[produced..produced + n]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + n]);
                self.buf_pos += n;
                self.account(&out[produced..produced + n]);
                produced += n;
            } else {
                let decoder = self
                    .decoder
                    .as_mut()
                    .ok_or_else(|| ZipError::invalid_parameter("entry has no decompressor"))?;
                if decoder.is_finished() {
                    break;
                }
                let (consumed, written, status) = decoder.decompress(
                    &self.buffer[self.buf_pos..self.buf_len],
                    &mut out[produced..want],
                )?;
                self.buf_pos += consumed;
                self.account(&out[produced..produced + written]);
                produced += written;

                if status == DecompressStatus::Done {
                    return Ok(produced);
                }
                if consumed == 0 && written == 0 {
                    if self.staged() == 0 && self.compressed_remaining == 0 {
                        return Err(ZipError::decompress(format!(
                            "compressed data of {} ends before the deflate stream",
                            self.name
                        )));
                    }
                    if status == DecompressStatus::NeedsInput && self.staged() > 0 {
                        return Err(ZipError::decompress(format!(
                            "decompressor stalled on {}",
                            self.name
                        )));
                    }
                }
            }
        }

        Ok(produced)
    }

    /// Uncompressed bytes produced so far.
    pub(crate) fn tell(&self) -> u64 {
        self.total_out
    }

    /// Whether every declared uncompressed byte has been produced.
    pub(crate) fn eof(&self) -> bool {
        self.uncompressed_remaining == 0
    }

    /// Absolute stream offset of the next compressed byte to load.
    pub(crate) fn payload_position(&self) -> u64 {
        self.position
    }

    /// Copy the next part of the local extra field into `buf`.
    pub(crate) fn read_local_extra<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        buf: &mut [u8],
    ) -> Result<usize> {
        let left = self.local_extra_len - self.local_extra_read;
        let n = (buf.len() as u64).min(left) as usize;
        if n == 0 {
            return Ok(0);
        }
        reader.seek(SeekFrom::Start(self.local_extra_offset + self.local_extra_read))?;
        reader.read_exact(&mut buf[..n])?;
        self.local_extra_read += n as u64;
        Ok(n)
    }

    /// Bytes of the local extra field not yet returned.
    pub(crate) fn local_extra_remaining(&self) -> u64 {
        self.local_extra_len - self.local_extra_read
    }

    /// End the session, verifying the CRC when the entry was fully read.
    pub(crate) fn finish(self) -> Result<()> {
        if self.raw || self.uncompressed_remaining != 0 {
            debug!(
                name = %self.name,
                produced = self.total_out,
                raw = self.raw,
                "closing entry without CRC check"
            );
            return Ok(());
        }
        let computed = self.crc.finalize();
        if computed != self.expected_crc {
            warn!(
                name = %self.name,
                expected = format_args!("{:#010x}", self.expected_crc),
                computed = format_args!("{:#010x}", computed),
                "CRC mismatch"
            );
            return Err(ZipError::crc_mismatch(self.expected_crc, computed));
        }
        Ok(())
    }
}
