//! Error types for ziptrail operations.
//!
//! Every fallible operation in the workspace returns [`ZipError`]. The
//! variants are fine-grained for diagnostics; [`ZipError::kind`] folds them
//! into the small set of categories callers usually branch on.
//!
//! Two conditions are deliberately *not* errors: reaching the end of the
//! central directory while enumerating (reported as `Ok(false)`) and reaching
//! the end of an entry while reading (reported as `Ok(0)`).

use std::io;
use thiserror::Error;

/// Coarse classification of a [`ZipError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid argument or an operation that is not valid in the current state.
    Parameter,
    /// The underlying byte stream failed (including unexpected end of file).
    Io,
    /// The archive structure is inconsistent or corrupt.
    Malformed,
    /// The entry uses a compression method this build cannot decode.
    UnsupportedMethod,
    /// The CRC-32 of the decompressed data does not match the directory.
    ChecksumMismatch,
    /// The decompressor rejected the compressed stream.
    Decompress,
    /// The supplied password does not decrypt the entry.
    Password,
}

/// The main error type for ziptrail operations.
#[derive(Debug, Error)]
pub enum ZipError {
    /// Invalid argument or state.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the misuse.
        message: String,
    },

    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record signature did not match.
    #[error("Invalid {structure} signature: expected {expected:#010x}, found {found:#010x}")]
    InvalidMagic {
        /// Name of the record being parsed.
        structure: &'static str,
        /// Expected signature.
        expected: u32,
        /// Signature found in the stream.
        found: u32,
    },

    /// Structural inconsistency in the archive.
    #[error("Malformed archive: {message}")]
    Malformed {
        /// Description of the inconsistency.
        message: String,
    },

    /// Unsupported compression method.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The method code from the archive.
        method: u16,
    },

    /// CRC checksum mismatch.
    #[error("CRC mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// CRC recorded in the central directory.
        expected: u32,
        /// CRC computed over the decompressed data.
        computed: u32,
    },

    /// The decompressor reported corrupt input.
    #[error("Decompression failed: {message}")]
    Decompress {
        /// Message from the decompressor.
        message: String,
    },

    /// The legacy encryption header did not verify.
    #[error("Invalid password")]
    InvalidPassword,
}

/// Result type alias for ziptrail operations.
pub type Result<T> = std::result::Result<T, ZipError>;

impl ZipError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create an invalid signature error.
    pub fn invalid_magic(structure: &'static str, expected: u32, found: u32) -> Self {
        Self::InvalidMagic {
            structure,
            expected,
            found,
        }
    }

    /// Create a malformed archive error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: u16) -> Self {
        Self::UnsupportedMethod { method }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::CrcMismatch { expected, computed }
    }

    /// Create a decompression error.
    pub fn decompress(message: impl Into<String>) -> Self {
        Self::Decompress {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } => ErrorKind::Parameter,
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidMagic { .. } | Self::Malformed { .. } => ErrorKind::Malformed,
            Self::UnsupportedMethod { .. } => ErrorKind::UnsupportedMethod,
            Self::CrcMismatch { .. } => ErrorKind::ChecksumMismatch,
            Self::Decompress { .. } => ErrorKind::Decompress,
            Self::InvalidPassword => ErrorKind::Password,
        }
    }

    /// Whether this error describes a structurally broken archive.
    pub fn is_malformed(&self) -> bool {
        self.kind() == ErrorKind::Malformed
    }
}
