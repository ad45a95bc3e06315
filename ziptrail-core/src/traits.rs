//! Core traits for streaming decompression.
//!
//! The archive reader never decodes compressed data itself. It drives an
//! implementation of [`Decompressor`] with slices of staged input and output
//! space, one bounded step at a time, so that decoding can be interleaved
//! with refills from the byte stream, decryption and checksumming.

use crate::error::Result;

/// Status of a streaming decompression operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressStatus {
    /// More input is needed to continue decompression.
    NeedsInput,
    /// More output buffer space is needed.
    NeedsOutput,
    /// The end of the compressed stream was reached.
    Done,
}

/// A streaming decompressor (decoder).
///
/// Implementations own their internal window and state; the caller owns the
/// input and output buffers and passes them in on every call.
pub trait Decompressor {
    /// Decompress data from input to output.
    ///
    /// # Arguments
    ///
    /// * `input` - Compressed bytes available to consume
    /// * `output` - Space for decompressed bytes
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, bytes written to output, status)
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize, DecompressStatus)>;

    /// Check if the decompressor has reached the end of the stream.
    fn is_finished(&self) -> bool;
}
