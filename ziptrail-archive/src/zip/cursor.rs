//! Directory cursor values.

use super::record::EntryRecord;

/// A position in the central directory together with the record parsed
/// there.
///
/// Cursors are plain values: any number of them can be held at once and
/// each can be opened independently. A cursor without a record is
/// exhausted (enumeration ended, or the record at its position failed to
/// parse) and entry-scoped operations reject it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirCursor {
    pub(crate) index: u64,
    pub(crate) offset: u64,
    pub(crate) entry: Option<EntryRecord>,
}

impl DirCursor {
    pub(crate) fn exhausted(index: u64, offset: u64) -> Self {
        Self {
            index,
            offset,
            entry: None,
        }
    }

    /// Zero-based entry index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Offset of the directory record, relative to the archive content.
    pub fn directory_offset(&self) -> u64 {
        self.offset
    }

    /// The record under the cursor.
    pub fn entry(&self) -> Option<&EntryRecord> {
        self.entry.as_ref()
    }

    /// Whether the cursor points at a parsed record.
    pub fn is_valid(&self) -> bool {
        self.entry.is_some()
    }

    /// Saveable position of this cursor, if it is valid.
    pub fn position(&self) -> Option<FilePosition> {
        self.entry.as_ref().map(|_| FilePosition {
            directory_offset: self.offset,
            index: self.index,
        })
    }

    pub(crate) fn invalidate(&mut self) {
        self.entry = None;
    }
}

/// Opaque saved position of a directory entry.
///
/// Jumping back to a saved position re-reads one record; it does not walk
/// the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilePosition {
    pub(crate) directory_offset: u64,
    pub(crate) index: u64,
}

impl FilePosition {
    /// Zero-based entry index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Offset of the directory record, relative to the archive content.
    pub fn directory_offset(&self) -> u64 {
        self.directory_offset
    }
}
