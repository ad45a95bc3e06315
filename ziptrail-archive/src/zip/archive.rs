//! The archive handle.
//!
//! [`ZipArchive`] owns the byte stream, the validated central directory
//! window, a built-in directory cursor and at most one open entry session.

use std::io::{self, BufReader, Read, Seek, SeekFrom};

use tracing::debug;

use ziptrail_core::error::{ErrorKind, Result, ZipError};
use ziptrail_core::traits::Decompressor;

use super::config::{ArchiveConfig, CaseSensitivity, OpenOptions};
use super::crypto::{ENCRYPTION_HEADER_SIZE, ZipCrypto};
use super::cursor::{DirCursor, FilePosition};
use super::header::{
    CompressionMethod, END_OF_CENTRAL_DIR_SIZE, EndOfCentralDirectory, ZIP64_MARKER_16,
    Zip64EndOfCentralDirectory,
};
use super::inflate::RawInflater;
use super::local::check_local_header;
use super::locator::locate;
use super::record::EntryRecord;
use super::stream::{EntrySession, SessionParams};

/// Buffer used while parsing one directory record.
const RECORD_READ_BUFFER: usize = 1024;

/// The validated central directory window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryInfo {
    /// Stream offset where the archive content begins (non-zero when a
    /// self-extractor stub or other data is prepended).
    pub content_offset: u64,
    /// Offset of the central directory, relative to the content.
    pub offset: u64,
    /// Size of the central directory in bytes.
    pub size: u64,
    /// Total number of entries.
    pub entries: u64,
    /// Whether the ZIP64 end record was used.
    pub zip64: bool,
    /// Absolute offset of the end record the directory precedes.
    pub end_record_offset: u64,
    /// Absolute offset of the 32-bit end record.
    pub eocd_offset: u64,
    /// Length of the archive comment.
    pub comment_len: u16,
    /// Total stream length.
    pub stream_len: u64,
}

impl DirectoryInfo {
    /// Whether the entry count is the 16-bit saturation value of an archive
    /// without ZIP64 records. Such archives are walked until the directory
    /// bytes run out instead of counting entries.
    fn count_unknown(&self) -> bool {
        !self.zip64 && self.entries == ZIP64_MARKER_16 as u64
    }

    fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Archive-wide summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalInfo {
    /// Number of entries in the central directory.
    pub entry_count: u64,
    /// Length of the archive comment.
    pub comment_len: u16,
}

/// What an entry-read session was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenedEntry {
    /// Compression method of the entry.
    pub method: CompressionMethod,
    /// Deflate level hint, for deflate-family methods.
    pub level: Option<u8>,
}

/// A ZIP archive opened for reading.
///
/// # Example
///
/// ```rust,no_run
/// use std::fs::File;
/// use std::io::BufReader;
/// use ziptrail_archive::zip::ZipArchive;
///
/// let file = BufReader::new(File::open("archive.zip")?);
/// let mut archive = ZipArchive::open(file)?;
/// let mut more = archive.current_entry().is_some();
/// while more {
///     archive.open_current()?;
///     let data = archive.read_current_to_end()?;
///     println!("{} bytes", data.len());
///     more = archive.go_to_next()?;
/// }
/// # Ok::<(), ziptrail_core::ZipError>(())
/// ```
pub struct ZipArchive<R: Read + Seek> {
    reader: R,
    config: ArchiveConfig,
    directory: DirectoryInfo,
    cursor: DirCursor,
    session: Option<EntrySession>,
}

impl<R: Read + Seek> ZipArchive<R> {
    /// Open an archive with the default configuration.
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_config(reader, ArchiveConfig::default())
    }

    /// Open an archive.
    ///
    /// Either a fully validated handle positioned on the first entry is
    /// returned, or an error.
    pub fn open_with_config(mut reader: R, config: ArchiveConfig) -> Result<Self> {
        let directory = read_directory_info(&mut reader)?;
        debug!(
            entries = directory.entries,
            zip64 = directory.zip64,
            content_offset = directory.content_offset,
            directory_offset = directory.offset,
            directory_size = directory.size,
            "opened archive"
        );

        let cursor = DirCursor::exhausted(0, directory.offset);
        let mut archive = Self {
            reader,
            config,
            directory,
            cursor,
            session: None,
        };
        archive.cursor = archive.first_cursor()?;
        Ok(archive)
    }

    /// The configuration the archive was opened with.
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// The validated directory window.
    pub fn directory(&self) -> &DirectoryInfo {
        &self.directory
    }

    /// Entry count and comment length.
    pub fn global_info(&self) -> GlobalInfo {
        GlobalInfo {
            entry_count: self.directory.entries,
            comment_len: self.directory.comment_len,
        }
    }

    /// Read the archive comment.
    ///
    /// A comment whose declared length runs past the end of the stream is
    /// returned truncated.
    pub fn comment(&mut self) -> Result<Vec<u8>> {
        let start = self.directory.eocd_offset + END_OF_CENTRAL_DIR_SIZE;
        let available = self.directory.stream_len.saturating_sub(start);
        let len = (self.directory.comment_len as u64).min(available) as usize;
        let mut comment = vec![0u8; len];
        self.reader.seek(SeekFrom::Start(start))?;
        self.reader.read_exact(&mut comment)?;
        Ok(comment)
    }

    // ------------------------------------------------------------------
    // Explicit cursors
    // ------------------------------------------------------------------

    fn read_record(&mut self, offset: u64) -> Result<EntryRecord> {
        let pos = self
            .directory
            .content_offset
            .checked_add(offset)
            .ok_or_else(|| ZipError::malformed("directory record offset overflows"))?;
        self.reader.seek(SeekFrom::Start(pos))?;
        let mut buffered = BufReader::with_capacity(RECORD_READ_BUFFER, &mut self.reader);
        EntryRecord::read(&mut buffered, &self.config.legacy_encoding)
    }

    fn cursor_from(&mut self, index: u64, offset: u64) -> Result<DirCursor> {
        let entry = self.read_record(offset)?;
        Ok(DirCursor {
            index,
            offset,
            entry: Some(entry),
        })
    }

    /// A cursor on the first entry; exhausted for an empty archive.
    pub fn first_cursor(&mut self) -> Result<DirCursor> {
        let empty = if self.directory.count_unknown() {
            self.directory.size == 0
        } else {
            self.directory.entries == 0
        };
        if empty {
            return Ok(DirCursor::exhausted(0, self.directory.offset));
        }
        self.cursor_from(0, self.directory.offset)
    }

    /// The cursor after `cursor`, or `None` at the end of the directory.
    ///
    /// The next record starts right after the variable-length parts of the
    /// current one.
    pub fn advance_cursor(&mut self, cursor: &DirCursor) -> Result<Option<DirCursor>> {
        let Some(entry) = cursor.entry.as_ref() else {
            return Ok(None);
        };
        let index = cursor.index + 1;
        let offset = cursor
            .offset
            .checked_add(entry.record_len())
            .ok_or_else(|| ZipError::malformed("directory record offset overflows"))?;

        let done = if self.directory.count_unknown() {
            offset >= self.directory.end()
        } else {
            index >= self.directory.entries
        };
        if done {
            return Ok(None);
        }
        self.cursor_from(index, offset).map(Some)
    }

    /// A cursor on the entry at a saved position.
    pub fn cursor_at(&mut self, position: FilePosition) -> Result<DirCursor> {
        let in_count = self.directory.count_unknown() || position.index < self.directory.entries;
        let in_window = position.directory_offset >= self.directory.offset
            && position.directory_offset < self.directory.end();
        if !in_count || !in_window {
            return Err(ZipError::invalid_parameter(format!(
                "position (index {}, offset {}) is outside the central directory",
                position.index, position.directory_offset
            )));
        }
        self.cursor_from(position.index, position.directory_offset)
    }

    /// Make `cursor` the archive's current cursor.
    pub fn set_cursor(&mut self, cursor: DirCursor) {
        self.cursor = cursor;
    }

    /// Snapshot every record without moving the current cursor.
    pub fn entries(&mut self) -> Result<Vec<EntryRecord>> {
        let mut records = Vec::new();
        let mut next = Some(self.first_cursor()?);
        while let Some(cursor) = next {
            next = self.advance_cursor(&cursor)?;
            if let Some(entry) = cursor.entry {
                records.push(entry);
            }
        }
        Ok(records)
    }

    // ------------------------------------------------------------------
    // Built-in cursor
    // ------------------------------------------------------------------

    /// The current cursor.
    pub fn cursor(&self) -> &DirCursor {
        &self.cursor
    }

    /// The record under the current cursor.
    pub fn current_entry(&self) -> Option<&EntryRecord> {
        self.cursor.entry()
    }

    fn replace_cursor(&mut self, next: Result<Option<DirCursor>>) -> Result<bool> {
        match next {
            Ok(Some(cursor)) => {
                let valid = cursor.is_valid();
                self.cursor = cursor;
                Ok(valid)
            }
            Ok(None) => {
                self.cursor.invalidate();
                Ok(false)
            }
            Err(e) => {
                self.cursor.invalidate();
                Err(e)
            }
        }
    }

    /// Move to the first entry. `Ok(false)` for an empty archive.
    pub fn go_to_first(&mut self) -> Result<bool> {
        let first = self.first_cursor().map(Some);
        self.replace_cursor(first)
    }

    /// Move to the next entry. `Ok(false)` at the end of the directory.
    pub fn go_to_next(&mut self) -> Result<bool> {
        if !self.cursor.is_valid() {
            return Ok(false);
        }
        let current = self.cursor.clone();
        let next = self.advance_cursor(&current);
        self.replace_cursor(next)
    }

    /// Find an entry by name, scanning from the first entry.
    ///
    /// On a miss (`Ok(false)`) or an error the current cursor is restored
    /// exactly as it was before the call.
    pub fn locate_file(&mut self, name: &str, mode: CaseSensitivity) -> Result<bool> {
        let mode = mode.resolve(self.config.case_sensitivity);
        let saved = self.cursor.clone();

        let mut step = self.go_to_first();
        loop {
            match step {
                Ok(true) => {
                    if self
                        .cursor
                        .entry()
                        .is_some_and(|entry| mode.names_equal(&entry.name, name))
                    {
                        return Ok(true);
                    }
                    step = self.go_to_next();
                }
                Ok(false) => {
                    self.cursor = saved;
                    return Ok(false);
                }
                Err(e) => {
                    self.cursor = saved;
                    return Err(e);
                }
            }
        }
    }

    /// Saveable position of the current entry.
    pub fn position(&self) -> Option<FilePosition> {
        self.cursor.position()
    }

    /// Jump to a saved position.
    ///
    /// A position outside the directory is rejected and leaves the cursor
    /// untouched; a record that fails to parse invalidates it.
    pub fn seek_to_position(&mut self, position: FilePosition) -> Result<()> {
        match self.cursor_at(position) {
            Ok(cursor) => {
                self.cursor = cursor;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::Parameter => Err(e),
            Err(e) => {
                self.cursor.invalidate();
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Entry sessions
    // ------------------------------------------------------------------

    /// Open the current entry for decompressed reading.
    pub fn open_current(&mut self) -> Result<OpenedEntry> {
        self.open_current_with(&OpenOptions::new())
    }

    /// Open the current entry.
    pub fn open_current_with(&mut self, options: &OpenOptions) -> Result<OpenedEntry> {
        let entry = self
            .cursor
            .entry
            .clone()
            .ok_or_else(|| ZipError::invalid_parameter("no current entry"))?;
        self.open_entry(&entry, options)
    }

    /// Open the entry under an explicit cursor.
    pub fn open_cursor(&mut self, cursor: &DirCursor, options: &OpenOptions) -> Result<OpenedEntry> {
        let entry = cursor
            .entry()
            .ok_or_else(|| ZipError::invalid_parameter("cursor is exhausted"))?;
        self.open_entry(entry, options)
    }

    fn discard_session(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.finish() {
                debug!(error = %e, "discarding result of implicit entry close");
            }
        }
    }

    fn open_entry(&mut self, entry: &EntryRecord, options: &OpenOptions) -> Result<OpenedEntry> {
        self.discard_session();

        let content_offset = self.directory.content_offset;
        let local = check_local_header(&mut self.reader, entry, content_offset)?;
        let mut payload_position = content_offset + local.payload_offset;
        let mut compressed_size = entry.compressed_size;

        let cipher = match (entry.is_encrypted(), options.password.as_deref()) {
            (true, Some(password)) => {
                let mut cipher = ZipCrypto::new(password);
                let mut header = [0u8; ENCRYPTION_HEADER_SIZE];
                self.reader.seek(SeekFrom::Start(payload_position))?;
                self.reader.read_exact(&mut header)?;
                cipher.verify_header(header, entry.encryption_check_byte())?;
                payload_position += ENCRYPTION_HEADER_SIZE as u64;
                compressed_size = compressed_size
                    .checked_sub(ENCRYPTION_HEADER_SIZE as u64)
                    .ok_or_else(|| {
                        ZipError::malformed(format!(
                            "encrypted entry {} is shorter than its encryption header",
                            entry.name
                        ))
                    })?;
                Some(cipher)
            }
            (true, None) if !options.raw => {
                return Err(ZipError::invalid_parameter(format!(
                    "entry {} is encrypted and no password was given",
                    entry.name
                )));
            }
            (false, Some(_)) => {
                debug!(name = %entry.name, "entry is not encrypted; ignoring password");
                None
            }
            _ => None,
        };

        let decoder = if options.raw {
            None
        } else {
            decoder_for(entry.method)?
        };

        self.session = Some(EntrySession::new(SessionParams {
            name: entry.name.clone(),
            method: entry.method,
            raw: options.raw,
            expected_crc: entry.crc32,
            compressed_size,
            uncompressed_size: entry.uncompressed_size,
            payload_position,
            buffer_size: self.config.read_buffer_size,
            decoder,
            cipher,
            local_extra_offset: content_offset + local.extra_offset,
            local_extra_len: local.extra_len,
        }));

        let level = match entry.method {
            CompressionMethod::Deflate | CompressionMethod::Deflate64 => {
                Some(entry.compression_level())
            }
            _ => None,
        };
        Ok(OpenedEntry {
            method: entry.method,
            level,
        })
    }

    fn session_ref(&self) -> Result<&EntrySession> {
        self.session
            .as_ref()
            .ok_or_else(|| ZipError::invalid_parameter("no entry is open"))
    }

    /// Read bytes of the open entry. `Ok(0)` at the end of the entry.
    pub fn read_current(&mut self, buf: &mut [u8]) -> Result<usize> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ZipError::invalid_parameter("no entry is open"))?;
        session.read(&mut self.reader, buf)
    }

    /// Close the open entry.
    ///
    /// Fails with a checksum mismatch when the entry was read to its end in
    /// decompressing mode and the CRC-32 differs from the directory's.
    pub fn close_current(&mut self) -> Result<()> {
        let session = self
            .session
            .take()
            .ok_or_else(|| ZipError::invalid_parameter("no entry is open"))?;
        session.finish()
    }

    /// Read the rest of the open entry, then close it.
    pub fn read_current_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut chunk = vec![0u8; self.config.read_buffer_size.max(4096)];
        loop {
            let n = self.read_current(&mut chunk)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        self.close_current()?;
        Ok(out)
    }

    /// Uncompressed bytes produced by the open entry so far.
    pub fn tell_current(&self) -> Result<u64> {
        Ok(self.session_ref()?.tell())
    }

    /// Whether the open entry has produced all its uncompressed bytes.
    pub fn eof_current(&self) -> Result<bool> {
        Ok(self.session_ref()?.eof())
    }

    /// Absolute stream offset of the next compressed byte of the open entry.
    pub fn current_payload_position(&self) -> Result<u64> {
        Ok(self.session_ref()?.payload_position())
    }

    /// Read the next part of the open entry's local extra field.
    ///
    /// Returns `Ok(0)` once the whole field has been returned.
    pub fn read_local_extra_field(&mut self, buf: &mut [u8]) -> Result<usize> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ZipError::invalid_parameter("no entry is open"))?;
        session.read_local_extra(&mut self.reader, buf)
    }

    /// Bytes of the open entry's local extra field not yet read.
    pub fn local_extra_remaining(&self) -> Result<u64> {
        Ok(self.session_ref()?.local_extra_remaining())
    }

    /// A [`Read`] adaptor over the open entry.
    pub fn current_reader(&mut self) -> Result<EntryReader<'_, R>> {
        self.session_ref()?;
        Ok(EntryReader { archive: self })
    }

    /// Close any open entry and return the underlying stream.
    pub fn into_inner(mut self) -> R {
        self.discard_session();
        self.reader
    }
}

impl<R: Read + Seek> std::fmt::Debug for ZipArchive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchive")
            .field("directory", &self.directory)
            .field("cursor_index", &self.cursor.index())
            .field("cursor_valid", &self.cursor.is_valid())
            .field("session_open", &self.session.is_some())
            .finish()
    }
}

/// Reader over the open entry of a [`ZipArchive`].
///
/// End of entry reads as end of file. Closing (and CRC verification) is
/// left to [`ZipArchive::close_current`].
pub struct EntryReader<'a, R: Read + Seek> {
    archive: &'a mut ZipArchive<R>,
}

impl<R: Read + Seek> Read for EntryReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.archive.read_current(buf).map_err(|e| match e {
            ZipError::Io(inner) => inner,
            other => io::Error::other(other),
        })
    }
}

fn decoder_for(method: CompressionMethod) -> Result<Option<Box<dyn Decompressor>>> {
    match method {
        CompressionMethod::Stored => Ok(None),
        CompressionMethod::Deflate => Ok(Some(Box::new(RawInflater::new()))),
        #[cfg(feature = "deflate64")]
        CompressionMethod::Deflate64 => Ok(Some(Box::new(super::inflate::Deflate64Inflater::new()))),
        other => Err(ZipError::unsupported_method(other.to_u16())),
    }
}

/// Parse and cross-check the end records.
fn read_directory_info<R: Read + Seek>(reader: &mut R) -> Result<DirectoryInfo> {
    let location = locate(reader)?;

    reader.seek(SeekFrom::Start(location.end_offset))?;
    let eocd = EndOfCentralDirectory::read(reader)?;

    let (entries, entries_on_disk, size, offset, disk, directory_disk, end_record_offset) =
        match location.zip64_end_offset {
            Some(zip64_offset) => {
                reader.seek(SeekFrom::Start(zip64_offset))?;
                let end = Zip64EndOfCentralDirectory::read(reader)?;
                (
                    end.total_entries,
                    end.entries_on_disk,
                    end.directory_size,
                    end.directory_offset,
                    end.disk_number,
                    end.directory_disk,
                    zip64_offset,
                )
            }
            None => (
                eocd.total_entries as u64,
                eocd.entries_on_disk as u64,
                eocd.directory_size as u64,
                eocd.directory_offset as u64,
                eocd.disk_number as u32,
                eocd.directory_disk as u32,
                location.end_offset,
            ),
        };

    if entries != entries_on_disk {
        return Err(ZipError::malformed(format!(
            "entry counts disagree ({} on this disk, {} in total); spanned archives are not supported",
            entries_on_disk, entries
        )));
    }
    if disk != 0 || directory_disk != 0 {
        return Err(ZipError::malformed(format!(
            "disk numbers {} and {} are not zero; spanned archives are not supported",
            disk, directory_disk
        )));
    }

    let directory_end = offset
        .checked_add(size)
        .ok_or_else(|| ZipError::malformed("central directory bounds overflow"))?;
    if end_record_offset < directory_end {
        return Err(ZipError::malformed(format!(
            "central directory (offset {}, size {}) extends past the end record at {}",
            offset, size, end_record_offset
        )));
    }

    Ok(DirectoryInfo {
        content_offset: end_record_offset - directory_end,
        offset,
        size,
        entries,
        zip64: location.zip64_end_offset.is_some(),
        end_record_offset,
        eocd_offset: location.end_offset,
        comment_len: eocd.comment_len,
        stream_len: location.stream_len,
    })
}
