//! # ziptrail Core
//!
//! Core components for the ziptrail ZIP reader.
//!
//! This crate provides the building blocks the archive layer is assembled
//! from:
//!
//! - [`bytes`]: Little-endian primitive readers over streams and slices
//! - [`crc`]: CRC-32 checksums
//! - [`traits`]: The streaming [`Decompressor`] contract
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ CLI                                                     │
//! │     ziptrail list / test / cat / info                   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Container                                               │
//! │     locator, central directory cursor, entry reader     │
//! ├─────────────────────────────────────────────────────────┤
//! │ Codec adapters                                          │
//! │     inflate (flate2), deflate64, legacy cipher          │
//! ├─────────────────────────────────────────────────────────┤
//! │ Primitives (this crate)                                 │
//! │     LE readers, CRC-32, Decompressor, ZipError          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ziptrail_core::bytes::LeRead;
//! use ziptrail_core::crc::Crc32;
//! use std::io::Cursor;
//!
//! let mut cur = Cursor::new(vec![0x50, 0x4B, 0x05, 0x06]);
//! assert_eq!(cur.le_u32().unwrap(), 0x06054B50);
//!
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bytes;
pub mod crc;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use bytes::{LeRead, LeSlice};
pub use crc::Crc32;
pub use error::{ErrorKind, Result, ZipError};
pub use traits::{DecompressStatus, Decompressor};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bytes::{LeRead, LeSlice};
    pub use crate::crc::Crc32;
    pub use crate::error::{ErrorKind, Result, ZipError};
    pub use crate::traits::{DecompressStatus, Decompressor};
}
