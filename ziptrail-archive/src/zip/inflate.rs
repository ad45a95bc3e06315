//! Decompressor adapters.
//!
//! ZIP stores deflate data without a zlib wrapper. [`RawInflater`] drives
//! `flate2`'s raw inflate one bounded step at a time; with the `deflate64`
//! feature, [`Deflate64Inflater`] does the same for method 9.

use flate2::{Decompress, FlushDecompress, Status};

use ziptrail_core::error::{Result, ZipError};
use ziptrail_core::traits::{DecompressStatus, Decompressor};

/// Raw (header-less) deflate decoder.
pub struct RawInflater {
    inner: Decompress,
    finished: bool,
}

impl RawInflater {
    /// New decoder expecting a raw deflate stream.
    pub fn new() -> Self {
        Self {
            inner: Decompress::new(false),
            finished: false,
        }
    }
}

impl Default for RawInflater {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor for RawInflater {
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize, DecompressStatus)> {
        let in_before = self.inner.total_in();
        let out_before = self.inner.total_out();
        let status = self
            .inner
            .decompress(input, output, FlushDecompress::Sync)
            .map_err(|e| ZipError::decompress(e.to_string()))?;
        let consumed = (self.inner.total_in() - in_before) as usize;
        let produced = (self.inner.total_out() - out_before) as usize;

        let status = match status {
            Status::StreamEnd => {
                self.finished = true;
                DecompressStatus::Done
            }
            Status::Ok | Status::BufError if produced == output.len() => {
                DecompressStatus::NeedsOutput
            }
            Status::Ok | Status::BufError => DecompressStatus::NeedsInput,
        };
        Ok((consumed, produced, status))
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Deflate64 (enhanced deflate) decoder.
#[cfg(feature = "deflate64")]
pub struct Deflate64Inflater {
    inner: Box<deflate64::InflaterManaged>,
}

#[cfg(feature = "deflate64")]
impl Deflate64Inflater {
    /// New decoder.
    pub fn new() -> Self {
        Self {
            inner: Box::new(deflate64::InflaterManaged::new()),
        }
    }
}

#[cfg(feature = "deflate64")]
impl Default for Deflate64Inflater {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "deflate64")]
impl Decompressor for Deflate64Inflater {
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize, DecompressStatus)> {
        let result = self.inner.inflate(input, output);
        if result.data_error {
            return Err(ZipError::decompress("invalid deflate64 data"));
        }
        let status = if self.inner.finished() {
            DecompressStatus::Done
        } else if result.bytes_written == output.len() {
            DecompressStatus::NeedsOutput
        } else {
            DecompressStatus::NeedsInput
        };
        Ok((result.bytes_consumed, result.bytes_written, status))
    }

    fn is_finished(&self) -> bool {
        self.inner.finished()
    }
}
