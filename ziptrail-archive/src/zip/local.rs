//! Local header coherency checks.
//!
//! Before an entry's payload is streamed, its local header is re-read and
//! compared with the central directory record. The local header's own name
//! and extra-field lengths decide where the payload starts; they are not
//! assumed to equal the central record's.

use std::io::{Read, Seek, SeekFrom};

use ziptrail_core::bytes::LeRead;
use ziptrail_core::error::{Result, ZipError};

use super::header::{
    FLAG_DATA_DESCRIPTOR, LOCAL_FILE_HEADER_SIG, LOCAL_FILE_HEADER_SIZE, ZIP64_MARKER_32,
};
use super::record::EntryRecord;

/// Layout facts taken from a verified local header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalHeader {
    /// Flags as written in the local header.
    pub flags: u16,
    /// Offset of the first payload byte, relative to the archive content.
    pub payload_offset: u64,
    /// Offset of the local extra field, relative to the archive content.
    pub extra_offset: u64,
    /// Length of the local extra field.
    pub extra_len: u16,
}

fn mismatch(field: &str, local: impl std::fmt::Display, central: impl std::fmt::Display) -> ZipError {
    ZipError::malformed(format!(
        "local header {} ({}) disagrees with central directory ({})",
        field, local, central
    ))
}

/// Read and verify the local header of `entry`.
///
/// `content_offset` converts the record's relative local header offset to a
/// stream position.
pub fn check_local_header<R: Read + Seek>(
    reader: &mut R,
    entry: &EntryRecord,
    content_offset: u64,
) -> Result<LocalHeader> {
    let header_pos = content_offset
        .checked_add(entry.local_header_offset)
        .ok_or_else(|| ZipError::malformed("local header offset overflows"))?;
    reader.seek(SeekFrom::Start(header_pos))?;

    reader.expect_signature("local file header", LOCAL_FILE_HEADER_SIG)?;
    let _version_needed = reader.le_u16()?;
    let flags = reader.le_u16()?;

    let method = reader.le_u16()?;
    if method != entry.method.to_u16() {
        return Err(mismatch("compression method", method, entry.method.to_u16()));
    }
    if !entry.method.is_supported() {
        return Err(ZipError::unsupported_method(method));
    }

    let _dos_datetime = reader.le_u32()?;
    let crc32 = reader.le_u32()?;
    let compressed_size = reader.le_u32()?;
    let uncompressed_size = reader.le_u32()?;

    // With a data descriptor these fields may legitimately be zero.
    if flags & FLAG_DATA_DESCRIPTOR == 0 {
        if crc32 != entry.crc32 {
            return Err(mismatch(
                "CRC-32",
                format_args!("{:#010x}", crc32),
                format_args!("{:#010x}", entry.crc32),
            ));
        }
        if compressed_size != ZIP64_MARKER_32 && compressed_size as u64 != entry.compressed_size {
            return Err(mismatch(
                "compressed size",
                compressed_size,
                entry.compressed_size,
            ));
        }
        if uncompressed_size != ZIP64_MARKER_32
            && uncompressed_size as u64 != entry.uncompressed_size
        {
            return Err(mismatch(
                "uncompressed size",
                uncompressed_size,
                entry.uncompressed_size,
            ));
        }
    }

    let name_len = reader.le_u16()?;
    if name_len != entry.name_len {
        return Err(mismatch("name length", name_len, entry.name_len));
    }
    let extra_len = reader.le_u16()?;

    let extra_offset = entry.local_header_offset + LOCAL_FILE_HEADER_SIZE + name_len as u64;
    Ok(LocalHeader {
        flags,
        payload_offset: extra_offset + extra_len as u64,
        extra_offset,
        extra_len,
    })
}
