//! Extra-field parsing.
//!
//! An extra field is a list of `tag (u16) | length (u16) | payload` chunks.
//! Two tags change how a central directory record is interpreted:
//!
//! - `0x0001` (ZIP64) carries 64-bit replacements for the base fields that
//!   were written as all-ones placeholders, in the fixed order uncompressed
//!   size, compressed size, local header offset, disk start. Only the
//!   placeholder fields are present.
//! - `0x7075` (Info-ZIP Unicode path) carries a UTF-8 name together with the
//!   CRC-32 of the legacy name it replaces.
//!
//! Every other tag is skipped by length.

use tracing::{debug, trace};

use ziptrail_core::bytes::LeSlice;
use ziptrail_core::error::{Result, ZipError};

use super::header::{ZIP64_MARKER_16, ZIP64_MARKER_32};

/// ZIP64 extended information tag.
pub const ZIP64_EXTRA_FIELD_ID: u16 = 0x0001;

/// Info-ZIP Unicode path tag.
pub const UNICODE_PATH_EXTRA_FIELD_ID: u16 = 0x7075;

/// One chunk of an extra field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraChunk<'a> {
    /// Chunk tag.
    pub tag: u16,
    /// Chunk payload.
    pub data: &'a [u8],
}

/// Iterator over the chunks of an extra field.
///
/// Stops at the first chunk whose declared length runs past the end of the
/// field; fewer than four trailing bytes are treated as padding.
#[derive(Debug, Clone)]
pub struct ExtraChunks<'a> {
    data: &'a [u8],
    pos: usize,
}

/// Walk the chunks of `extra`.
pub fn chunks(extra: &[u8]) -> ExtraChunks<'_> {
    ExtraChunks {
        data: extra,
        pos: 0,
    }
}

impl<'a> Iterator for ExtraChunks<'a> {
    type Item = ExtraChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.data[self.pos..];
        if rest.len() < 4 {
            if !rest.is_empty() {
                trace!(bytes = rest.len(), "ignoring extra-field padding");
            }
            self.pos = self.data.len();
            return None;
        }
        let tag = u16::from_le_bytes([rest[0], rest[1]]);
        let len = u16::from_le_bytes([rest[2], rest[3]]) as usize;
        if 4 + len > rest.len() {
            debug!(
                tag = format_args!("{:#06x}", tag),
                declared = len,
                available = rest.len() - 4,
                "extra-field chunk overruns the field; ignoring the rest"
            );
            self.pos = self.data.len();
            return None;
        }
        self.pos += 4 + len;
        Some(ExtraChunk {
            tag,
            data: &rest[4..4 + len],
        })
    }
}

/// A base-record field that may be a ZIP64 placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declared {
    /// The value written in the base record.
    Value(u64),
    /// All-ones: the real value lives in the ZIP64 extra field.
    Placeholder,
}

impl Declared {
    /// Classify a 32-bit base field.
    pub fn from_u32(value: u32) -> Self {
        if value == ZIP64_MARKER_32 {
            Self::Placeholder
        } else {
            Self::Value(value as u64)
        }
    }

    /// Classify a 16-bit base field.
    pub fn from_u16(value: u16) -> Self {
        if value == ZIP64_MARKER_16 {
            Self::Placeholder
        } else {
            Self::Value(value as u64)
        }
    }

    /// Whether the field defers to the ZIP64 extra field.
    pub fn is_placeholder(self) -> bool {
        matches!(self, Self::Placeholder)
    }

    /// Final value: the declared one, or the override for a placeholder.
    ///
    /// A placeholder without an override is a malformed record.
    pub fn resolve(self, replacement: Option<u64>, field: &str) -> Result<u64> {
        match (self, replacement) {
            (Self::Value(value), _) => Ok(value),
            (Self::Placeholder, Some(value)) => Ok(value),
            (Self::Placeholder, None) => Err(ZipError::malformed(format!(
                "{} is a ZIP64 placeholder but no ZIP64 extra field supplies it",
                field
            ))),
        }
    }
}

/// Which base fields were placeholders, in ZIP64 extra-field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64Needs {
    /// Uncompressed size was all-ones.
    pub uncompressed_size: bool,
    /// Compressed size was all-ones.
    pub compressed_size: bool,
    /// Local header offset was all-ones.
    pub local_header_offset: bool,
    /// Disk start was all-ones.
    pub disk_start: bool,
}

impl Zip64Needs {
    /// Whether any field needs a ZIP64 value.
    pub fn any(self) -> bool {
        self.uncompressed_size || self.compressed_size || self.local_header_offset || self.disk_start
    }
}

/// Values supplied by a ZIP64 extra field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64Overrides {
    /// 64-bit uncompressed size.
    pub uncompressed_size: Option<u64>,
    /// 64-bit compressed size.
    pub compressed_size: Option<u64>,
    /// 64-bit local header offset.
    pub local_header_offset: Option<u64>,
    /// 32-bit disk start.
    pub disk_start: Option<u32>,
}

impl Zip64Overrides {
    /// Parse a ZIP64 payload, reading only the fields listed in `needs`.
    pub fn parse(data: &[u8], needs: Zip64Needs) -> Result<Self> {
        let mut payload = LeSlice::new(data);
        let mut out = Self::default();
        if needs.uncompressed_size {
            out.uncompressed_size = Some(payload.u64()?);
        }
        if needs.compressed_size {
            out.compressed_size = Some(payload.u64()?);
        }
        if needs.local_header_offset {
            out.local_header_offset = Some(payload.u64()?);
        }
        if needs.disk_start {
            out.disk_start = Some(payload.u32()?);
        }
        Ok(out)
    }

    /// Overwrite fields with those present in `other`.
    fn merge(&mut self, other: Self) {
        self.uncompressed_size = other.uncompressed_size.or(self.uncompressed_size);
        self.compressed_size = other.compressed_size.or(self.compressed_size);
        self.local_header_offset = other.local_header_offset.or(self.local_header_offset);
        self.disk_start = other.disk_start.or(self.disk_start);
    }
}

/// Payload of a version-1 Unicode path chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnicodePath {
    /// CRC-32 of the legacy name this entry replaces.
    pub name_crc: u32,
    /// UTF-8 name bytes.
    pub name: Vec<u8>,
}

impl UnicodePath {
    /// Parse a chunk payload; `None` for unsupported versions or empty names.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() <= 5 {
            return None;
        }
        if data[0] != 1 {
            trace!(version = data[0], "skipping Unicode path extra field");
            return None;
        }
        Some(Self {
            name_crc: u32::from_le_bytes([data[1], data[2], data[3], data[4]]),
            name: data[5..].to_vec(),
        })
    }
}

/// What a central directory extra field contributes to its record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CentralExtra {
    /// ZIP64 replacements for placeholder fields.
    pub zip64: Zip64Overrides,
    /// Unicode path candidate (checked against the legacy name later).
    pub unicode_path: Option<UnicodePath>,
}

/// Walk a central directory extra field.
pub fn parse_central_extra(extra: &[u8], needs: Zip64Needs) -> Result<CentralExtra> {
    let mut out = CentralExtra::default();
    for chunk in chunks(extra) {
        match chunk.tag {
            ZIP64_EXTRA_FIELD_ID => {
                let parsed = Zip64Overrides::parse(chunk.data, needs)
                    .map_err(|_| ZipError::malformed("ZIP64 extra field is too short"))?;
                out.zip64.merge(parsed);
            }
            UNICODE_PATH_EXTRA_FIELD_ID => {
                if let Some(path) = UnicodePath::parse(chunk.data) {
                    out.unicode_path = Some(path);
                }
            }
            tag => {
                trace!(tag = format_args!("{:#06x}", tag), len = chunk.data.len(), "skipping extra field");
            }
        }
    }
    Ok(out)
}
