//! # ziptrail Archive
//!
//! Streaming ZIP/ZIP64 reader.
//!
//! The reader never loads a whole entry or the whole directory into memory.
//! It locates the end of central directory record, validates the directory
//! window, and then walks directory records one at a time with a cursor.
//! Any entry under a cursor can be opened and streamed: bytes are refilled
//! through a bounded staging buffer, decrypted if needed, inflated and
//! checksummed as they are read.
//!
//! Supported:
//!
//! - **Stored** and **Deflate** entries (**Deflate64** with the `deflate64`
//!   feature)
//! - **ZIP64** end records and extra fields
//! - **Unicode path** extra fields and legacy code-page names
//! - Archives with prepended data (self-extractors)
//! - Legacy PKWARE encryption
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use ziptrail_archive::{CaseSensitivity, ZipArchive};
//!
//! let file = BufReader::new(File::open("archive.zip")?);
//! let mut archive = ZipArchive::open(file)?;
//! if archive.locate_file("docs/readme.txt", CaseSensitivity::PlatformDefault)? {
//!     archive.open_current()?;
//!     let text = archive.read_current_to_end()?;
//!     println!("{}", String::from_utf8_lossy(&text));
//! }
//! # Ok::<(), ziptrail_core::ZipError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod zip;

// Re-exports
pub use zip::{
    ArchiveConfig, CaseSensitivity, CompressionMethod, DirCursor, DosDateTime, EntryReader,
    EntryRecord, FilePosition, GlobalInfo, LegacyEncoding, NameSource, OpenOptions, OpenedEntry,
    ZipArchive,
};
