//! ZIP record signatures, fixed layouts and small value types.
//!
//! Everything here is a direct decode of a fixed-size on-disk structure; the
//! variable-length parts (names, extra fields, comments) are handled by the
//! record and extra-field parsers.

use std::fmt;
use std::io::Read;

use ziptrail_core::bytes::LeRead;
use ziptrail_core::error::Result;

/// ZIP local file header signature.
pub const LOCAL_FILE_HEADER_SIG: u32 = 0x04034B50;

/// ZIP central directory header signature.
pub const CENTRAL_DIR_HEADER_SIG: u32 = 0x02014B50;

/// ZIP end of central directory signature.
pub const END_OF_CENTRAL_DIR_SIG: u32 = 0x06054B50;

/// ZIP64 end of central directory signature.
pub const ZIP64_END_OF_CENTRAL_DIR_SIG: u32 = 0x06064B50;

/// ZIP64 end of central directory locator signature.
pub const ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIG: u32 = 0x07064B50;

/// Size of the fixed part of a local file header.
pub const LOCAL_FILE_HEADER_SIZE: u64 = 30;

/// Size of the fixed part of a central directory record.
pub const CENTRAL_DIR_HEADER_SIZE: u64 = 46;

/// Size of the fixed part of the end of central directory record.
pub const END_OF_CENTRAL_DIR_SIZE: u64 = 22;

/// Size of the ZIP64 end of central directory locator.
pub const ZIP64_LOCATOR_SIZE: u64 = 20;

/// Marker value for Zip64 (0xFFFFFFFF for 32-bit fields).
pub const ZIP64_MARKER_32: u32 = 0xFFFF_FFFF;

/// Marker value for Zip64 (0xFFFF for 16-bit fields).
pub const ZIP64_MARKER_16: u16 = 0xFFFF;

/// Flag bit: entry is encrypted with the legacy PKWARE cipher.
pub const FLAG_ENCRYPTED: u16 = 0x0001;

/// Flag bit: CRC and sizes follow the data in a data descriptor.
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// Flag bit: name and comment are UTF-8.
pub const FLAG_UTF8: u16 = 0x0800;

/// ZIP compression methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Stored (no compression).
    Stored,
    /// Deflate compression.
    Deflate,
    /// Enhanced deflate (method 9).
    Deflate64,
    /// Unknown method.
    Unknown(u16),
}

impl CompressionMethod {
    /// Create from a u16 value.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::Stored,
            8 => Self::Deflate,
            9 => Self::Deflate64,
            _ => Self::Unknown(value),
        }
    }

    /// The on-disk method code.
    pub fn to_u16(self) -> u16 {
        match self {
            Self::Stored => 0,
            Self::Deflate => 8,
            Self::Deflate64 => 9,
            Self::Unknown(value) => value,
        }
    }

    /// Whether this build can decode the method.
    pub fn is_supported(self) -> bool {
        match self {
            Self::Stored | Self::Deflate => true,
            Self::Deflate64 => cfg!(feature = "deflate64"),
            Self::Unknown(_) => false,
        }
    }

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stored => "Stored",
            Self::Deflate => "Deflate",
            Self::Deflate64 => "Deflate64",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(value) => write!(f, "Unknown({})", value),
            other => f.write_str(other.name()),
        }
    }
}

/// Calendar fields of a packed MS-DOS timestamp.
///
/// The packed value stores the date in the high 16 bits and the time in the
/// low 16 bits; seconds have two-second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DosDateTime {
    /// Full year (1980-2107).
    pub year: u16,
    /// Month, 1-12.
    pub month: u8,
    /// Day of month, 1-31.
    pub day: u8,
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// Second, 0-58 in steps of two.
    pub second: u8,
}

impl DosDateTime {
    /// Decode a packed `date << 16 | time` value.
    pub fn from_packed(packed: u32) -> Self {
        let date = (packed >> 16) as u16;
        let time = packed as u16;
        Self {
            year: ((date >> 9) & 0x7F) + 1980,
            month: (((date >> 5) & 0x0F) as u8).max(1),
            day: (date & 0x1F) as u8,
            hour: ((time >> 11) & 0x1F) as u8,
            minute: ((time >> 5) & 0x3F) as u8,
            second: ((time & 0x1F) * 2) as u8,
        }
    }
}

impl fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// The 32-bit end of central directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    /// Number of this disk.
    pub disk_number: u16,
    /// Disk holding the start of the central directory.
    pub directory_disk: u16,
    /// Entries recorded on this disk.
    pub entries_on_disk: u16,
    /// Entries in the whole central directory.
    pub total_entries: u16,
    /// Size of the central directory in bytes.
    pub directory_size: u32,
    /// Offset of the central directory relative to the archive content.
    pub directory_offset: u32,
    /// Length of the trailing archive comment.
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    /// Read the record at the current position, signature included.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        reader.expect_signature("end of central directory", END_OF_CENTRAL_DIR_SIG)?;
        Ok(Self {
            disk_number: reader.le_u16()?,
            directory_disk: reader.le_u16()?,
            entries_on_disk: reader.le_u16()?,
            total_entries: reader.le_u16()?,
            directory_size: reader.le_u32()?,
            directory_offset: reader.le_u32()?,
            comment_len: reader.le_u16()?,
        })
    }
}

/// The ZIP64 end of central directory locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64EndLocator {
    /// Disk holding the ZIP64 end record.
    pub end_disk: u32,
    /// Absolute offset of the ZIP64 end record.
    pub end_offset: u64,
    /// Total number of disks.
    pub total_disks: u32,
}

impl Zip64EndLocator {
    /// Read the locator at the current position, signature included.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        reader.expect_signature(
            "ZIP64 end of central directory locator",
            ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIG,
        )?;
        Ok(Self {
            end_disk: reader.le_u32()?,
            end_offset: reader.le_u64()?,
            total_disks: reader.le_u32()?,
        })
    }
}

/// The ZIP64 end of central directory record (fixed part).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64EndOfCentralDirectory {
    /// Size of the remaining record.
    pub record_size: u64,
    /// Version made by.
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// Number of this disk.
    pub disk_number: u32,
    /// Disk holding the start of the central directory.
    pub directory_disk: u32,
    /// Entries recorded on this disk.
    pub entries_on_disk: u64,
    /// Entries in the whole central directory.
    pub total_entries: u64,
    /// Size of the central directory in bytes.
    pub directory_size: u64,
    /// Offset of the central directory relative to the archive content.
    pub directory_offset: u64,
}

impl Zip64EndOfCentralDirectory {
    /// Read the record at the current position, signature included.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        reader.expect_signature(
            "ZIP64 end of central directory",
            ZIP64_END_OF_CENTRAL_DIR_SIG,
        )?;
        Ok(Self {
            record_size: reader.le_u64()?,
            version_made_by: reader.le_u16()?,
            version_needed: reader.le_u16()?,
            disk_number: reader.le_u32()?,
            directory_disk: reader.le_u32()?,
            entries_on_disk: reader.le_u64()?,
            total_entries: reader.le_u64()?,
            directory_size: reader.le_u64()?,
            directory_offset: reader.le_u64()?,
        })
    }
}
