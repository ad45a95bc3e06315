//! ZIP archive reading.
//!
//! This module reads ZIP and ZIP64 archives as specified in the PKWARE
//! APPNOTE, streaming one entry at a time:
//!
//! - [`locator`]: finds the end of central directory record (and the ZIP64
//!   records) by scanning backwards from the end of the stream
//! - [`ZipArchive`]: validates the directory window and owns the stream
//! - [`DirCursor`]: enumerates and seeks central directory records
//! - [`local`]: cross-checks each local header against its directory record
//! - entry sessions: buffered refill, decryption, inflate and CRC-32
//!
//! Names are normalized to UTF-8 from the UTF-8 flag, the Unicode path
//! extra field, or a configurable legacy code page.

mod archive;
pub mod config;
pub mod crypto;
mod cursor;
pub mod extra;
pub mod filename;
pub mod header;
pub mod inflate;
pub mod local;
pub mod locator;
pub mod record;
mod stream;

pub use archive::{DirectoryInfo, EntryReader, GlobalInfo, OpenedEntry, ZipArchive};
pub use config::{ArchiveConfig, CaseSensitivity, DEFAULT_READ_BUFFER_SIZE, OpenOptions};
pub use cursor::{DirCursor, FilePosition};
pub use filename::{LegacyEncoding, NameSource};
pub use header::{CompressionMethod, DosDateTime};
pub use record::EntryRecord;
