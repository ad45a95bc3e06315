//! Central directory records.

use std::io::Read;

use ziptrail_core::bytes::LeRead;
use ziptrail_core::error::Result;

use super::extra::{Declared, Zip64Needs, parse_central_extra};
use super::filename::{LegacyEncoding, NameSource, resolve_name};
use super::header::{
    CENTRAL_DIR_HEADER_SIG, CENTRAL_DIR_HEADER_SIZE, CompressionMethod, DosDateTime,
    FLAG_DATA_DESCRIPTOR, FLAG_ENCRYPTED, FLAG_UTF8,
};

/// Metadata of one archive entry, as recorded in the central directory.
///
/// Sizes, the local header offset and the disk start are final values: any
/// ZIP64 placeholder in the base record has already been replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Version made by (high byte: host system).
    pub version_made_by: u16,
    /// Minimum version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flags.
    pub flags: u16,
    /// Compression method.
    pub method: CompressionMethod,
    /// Packed MS-DOS timestamp (`date << 16 | time`).
    pub dos_datetime: u32,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    /// Uncompressed size in bytes.
    pub uncompressed_size: u64,
    /// Length of the raw name in the record.
    pub name_len: u16,
    /// Length of the extra field in the record.
    pub extra_len: u16,
    /// Length of the entry comment in the record.
    pub comment_len: u16,
    /// Disk holding the local header.
    pub disk_start: u32,
    /// Internal file attributes.
    pub internal_attrs: u16,
    /// External file attributes (host-specific, e.g. Unix mode in the high half).
    pub external_attrs: u32,
    /// Offset of the local header, relative to the archive content.
    pub local_header_offset: u64,
    /// Name bytes exactly as stored.
    pub raw_name: Vec<u8>,
    /// Normalized UTF-8 name.
    pub name: String,
    /// Where `name` came from.
    pub name_source: NameSource,
    /// Entry comment bytes.
    pub comment: Vec<u8>,
}

impl EntryRecord {
    /// Parse one record at the current position.
    ///
    /// Fields are read in on-disk order, then the name, the extra field and
    /// the comment. ZIP64 and Unicode path extra fields are applied before
    /// the record is returned.
    pub fn read<R: Read>(reader: &mut R, legacy: &LegacyEncoding) -> Result<Self> {
        reader.expect_signature("central directory file header", CENTRAL_DIR_HEADER_SIG)?;

        let version_made_by = reader.le_u16()?;
        let version_needed = reader.le_u16()?;
        let flags = reader.le_u16()?;
        let method = CompressionMethod::from_u16(reader.le_u16()?);
        let dos_datetime = reader.le_u32()?;
        let crc32 = reader.le_u32()?;
        let compressed_size = Declared::from_u32(reader.le_u32()?);
        let uncompressed_size = Declared::from_u32(reader.le_u32()?);
        let name_len = reader.le_u16()?;
        let extra_len = reader.le_u16()?;
        let comment_len = reader.le_u16()?;
        let disk_start = Declared::from_u16(reader.le_u16()?);
        let internal_attrs = reader.le_u16()?;
        let external_attrs = reader.le_u32()?;
        let local_header_offset = Declared::from_u32(reader.le_u32()?);

        let raw_name = reader.le_bytes(name_len as usize)?;
        let extra = reader.le_bytes(extra_len as usize)?;
        let comment = reader.le_bytes(comment_len as usize)?;

        let needs = Zip64Needs {
            uncompressed_size: uncompressed_size.is_placeholder(),
            compressed_size: compressed_size.is_placeholder(),
            local_header_offset: local_header_offset.is_placeholder(),
            disk_start: disk_start.is_placeholder(),
        };
        let fields = parse_central_extra(&extra, needs)?;
        let zip64 = fields.zip64;

        let (name, name_source) =
            resolve_name(&raw_name, flags, fields.unicode_path.as_ref(), legacy);

        Ok(Self {
            version_made_by,
            version_needed,
            flags,
            method,
            dos_datetime,
            crc32,
            compressed_size: compressed_size.resolve(zip64.compressed_size, "compressed size")?,
            uncompressed_size: uncompressed_size
                .resolve(zip64.uncompressed_size, "uncompressed size")?,
            name_len,
            extra_len,
            comment_len,
            disk_start: disk_start.resolve(zip64.disk_start.map(u64::from), "disk start")? as u32,
            internal_attrs,
            external_attrs,
            local_header_offset: local_header_offset
                .resolve(zip64.local_header_offset, "local header offset")?,
            raw_name,
            name,
            name_source,
            comment,
        })
    }

    /// Bytes this record occupies in the central directory.
    pub fn record_len(&self) -> u64 {
        CENTRAL_DIR_HEADER_SIZE
            + self.name_len as u64
            + self.extra_len as u64
            + self.comment_len as u64
    }

    /// Calendar form of the timestamp.
    pub fn modified(&self) -> DosDateTime {
        DosDateTime::from_packed(self.dos_datetime)
    }

    /// Whether the entry is encrypted with the legacy cipher.
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// Whether CRC and sizes follow the data in a data descriptor.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    /// Whether the UTF-8 flag is set.
    pub fn is_utf8(&self) -> bool {
        self.flags & FLAG_UTF8 != 0
    }

    /// Whether the entry names a directory.
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Deflate level hint encoded in flag bits 1-2.
    ///
    /// 9 for maximum, 2 for fast, 1 for super fast, otherwise 6.
    pub fn compression_level(&self) -> u8 {
        match self.flags & 0x06 {
            0x06 => 1,
            0x04 => 2,
            0x02 => 9,
            _ => 6,
        }
    }

    /// Unix permission bits, when the entry was made on a Unix host.
    pub fn unix_mode(&self) -> Option<u32> {
        const HOST_UNIX: u16 = 3;
        if self.version_made_by >> 8 == HOST_UNIX {
            Some(self.external_attrs >> 16)
        } else {
            None
        }
    }

    /// Check byte that ends a decrypted legacy encryption header.
    pub fn encryption_check_byte(&self) -> u8 {
        if self.has_data_descriptor() {
            (self.dos_datetime >> 8) as u8
        } else {
            (self.crc32 >> 24) as u8
        }
    }
}
