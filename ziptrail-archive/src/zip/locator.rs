//! End of central directory locator.
//!
//! The end record sits at the very end of the archive, followed only by an
//! archive comment of up to 65535 bytes. It is found by scanning backwards
//! from the end of the stream in overlapping windows: each step moves the
//! window back by [`SCAN_STEP`] bytes but reads `SCAN_STEP + 4`, so a
//! signature straddling two windows is still seen whole. Within a window the
//! scan also runs backwards, so the occurrence nearest the end of the file
//! wins among the candidates whose record and comment fit inside the stream.
//! The signature bytes may also appear inside the comment itself; such a
//! candidate overruns the stream and is skipped.
//!
//! A ZIP64 archive additionally has a locator record immediately before the
//! end record, pointing at the ZIP64 end record.

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, trace};

use ziptrail_core::bytes::LeRead;
use ziptrail_core::error::{Result, ZipError};

use super::header::{
    END_OF_CENTRAL_DIR_SIG, END_OF_CENTRAL_DIR_SIZE, ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIG,
    ZIP64_END_OF_CENTRAL_DIR_SIG, ZIP64_LOCATOR_SIZE, Zip64EndLocator,
};

/// Largest archive comment a 16-bit length can describe.
pub const MAX_COMMENT_LEN: u64 = 0xFFFF;

/// Distance the scan window moves per step.
pub const SCAN_STEP: u64 = 1024;

/// Where the trailing records were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndLocation {
    /// Absolute offset of the 32-bit end of central directory record.
    pub end_offset: u64,
    /// Absolute offset of the ZIP64 end record, when the archive has one.
    pub zip64_end_offset: Option<u64>,
    /// Total stream length.
    pub stream_len: u64,
}

/// Scan backwards for the end of central directory signature.
///
/// Returns the absolute offset of the signature, or a malformed-archive
/// error when the trailing `65535 + 22` bytes do not contain one.
pub fn find_end_of_central_directory<R: Read + Seek>(reader: &mut R) -> Result<u64> {
    let stream_len = reader.seek(SeekFrom::End(0))?;
    let signature = END_OF_CENTRAL_DIR_SIG.to_le_bytes();
    let max_back = (MAX_COMMENT_LEN + END_OF_CENTRAL_DIR_SIZE).min(stream_len);

    let mut window = vec![0u8; (SCAN_STEP + 4) as usize];
    let mut back_read: u64 = 4;
    // Candidates at or above this offset were already examined.
    let mut checked_from = stream_len;
    while back_read < max_back {
        back_read = (back_read + SCAN_STEP).min(max_back);
        let read_pos = stream_len - back_read;
        let read_size = (SCAN_STEP + 4).min(stream_len - read_pos) as usize;

        reader.seek(SeekFrom::Start(read_pos))?;
        reader.read_exact(&mut window[..read_size])?;

        let mut end = read_size;
        while let Some(i) = window[..end]
            .windows(4)
            .rposition(|candidate| candidate == signature)
        {
            end = i + 3;
            let found = read_pos + i as u64;
            if found >= checked_from {
                continue;
            }
            if end_record_fits(reader, found, stream_len)? {
                trace!(offset = found, "found end of central directory signature");
                return Ok(found);
            }
            trace!(offset = found, "end record candidate overruns the stream");
        }
        checked_from = read_pos;
    }

    Err(ZipError::malformed(
        "end of central directory signature not found",
    ))
}

/// Whether an end record at `offset`, with its declared comment, fits
/// inside a stream of `stream_len` bytes.
fn end_record_fits<R: Read + Seek>(reader: &mut R, offset: u64, stream_len: u64) -> Result<bool> {
    if offset + END_OF_CENTRAL_DIR_SIZE > stream_len {
        return Ok(false);
    }
    reader.seek(SeekFrom::Start(offset + END_OF_CENTRAL_DIR_SIZE - 2))?;
    let comment_len = reader.le_u16()? as u64;
    Ok(offset + END_OF_CENTRAL_DIR_SIZE + comment_len <= stream_len)
}

/// Follow the ZIP64 locator that precedes the end record at `end_offset`.
///
/// Returns `Ok(None)` when there is no locator. A locator that names another
/// disk, or a disk count other than zero or one, is a spanned archive and is
/// rejected; so is a locator whose target lacks the ZIP64 end signature.
pub fn find_zip64_end<R: Read + Seek>(reader: &mut R, end_offset: u64) -> Result<Option<u64>> {
    let Some(locator_offset) = end_offset.checked_sub(ZIP64_LOCATOR_SIZE) else {
        return Ok(None);
    };

    reader.seek(SeekFrom::Start(locator_offset))?;
    if reader.le_u32()? != ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIG {
        return Ok(None);
    }

    reader.seek(SeekFrom::Start(locator_offset))?;
    let locator = Zip64EndLocator::read(reader)?;
    if locator.end_disk != 0 {
        return Err(ZipError::malformed(format!(
            "ZIP64 end record is on disk {}; spanned archives are not supported",
            locator.end_disk
        )));
    }
    if locator.total_disks > 1 {
        return Err(ZipError::malformed(format!(
            "archive spans {} disks; spanned archives are not supported",
            locator.total_disks
        )));
    }

    reader.seek(SeekFrom::Start(locator.end_offset))?;
    reader.expect_signature(
        "ZIP64 end of central directory",
        ZIP64_END_OF_CENTRAL_DIR_SIG,
    )?;
    debug!(
        locator = locator_offset,
        zip64_end = locator.end_offset,
        "found ZIP64 end of central directory"
    );
    Ok(Some(locator.end_offset))
}

/// Locate the end record and, if present, the ZIP64 end record.
pub fn locate<R: Read + Seek>(reader: &mut R) -> Result<EndLocation> {
    let end_offset = find_end_of_central_directory(reader)?;
    let zip64_end_offset = find_zip64_end(reader, end_offset)?;
    let stream_len = reader.seek(SeekFrom::End(0))?;
    Ok(EndLocation {
        end_offset,
        zip64_end_offset,
        stream_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn eocd(comment: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&END_OF_CENTRAL_DIR_SIG.to_le_bytes());
        out.extend_from_slice(&[0u8; 16]);
        out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        out.extend_from_slice(comment);
        out
    }

    fn zip64_locator(disk: u32, offset: u64, total: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIG.to_le_bytes());
        out.extend_from_slice(&disk.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&total.to_le_bytes());
        out
    }

    #[test]
    fn test_bare_end_record() {
        let data = eocd(b"");
        let loc = locate(&mut Cursor::new(data)).unwrap();
        assert_eq!(loc.end_offset, 0);
        assert_eq!(loc.zip64_end_offset, None);
        assert_eq!(loc.stream_len, 22);
    }

    #[test]
    fn test_end_record_behind_payload_and_comment() {
        let mut data = vec![0xAAu8; 5000];
        let comment = vec![b'c'; 3000];
        data.extend(eocd(&comment));
        let found = find_end_of_central_directory(&mut Cursor::new(data)).unwrap();
        assert_eq!(found, 5000);
    }

    #[test]
    fn test_signature_across_window_boundary() {
        // Place the signature so it straddles the first window edge.
        for shift in 0..6u64 {
            let comment_len = SCAN_STEP as usize - 22 + shift as usize;
            let mut data = vec![0u8; 5000];
            data.extend(eocd(&vec![b'x'; comment_len]));
            let found = find_end_of_central_directory(&mut Cursor::new(data)).unwrap();
            assert_eq!(found, 5000, "shift {}", shift);
        }
    }

    #[test]
    fn test_nearest_to_end_wins() {
        let mut data = eocd(b"");
        data.extend(eocd(b""));
        let found = find_end_of_central_directory(&mut Cursor::new(data)).unwrap();
        assert_eq!(found, 22);
    }

    #[test]
    fn test_signature_inside_comment_skipped() {
        let mut comment = b"notes ".to_vec();
        comment.extend_from_slice(&END_OF_CENTRAL_DIR_SIG.to_le_bytes());
        comment.extend_from_slice(b" end");
        let mut data = vec![0x11u8; 300];
        data.extend(eocd(&comment));
        let found = find_end_of_central_directory(&mut Cursor::new(data)).unwrap();
        assert_eq!(found, 300);
    }

    #[test]
    fn test_candidate_with_overlong_comment_skipped() {
        // A complete fake record in the comment whose own comment length
        // runs past the end of the stream.
        let mut fake = END_OF_CENTRAL_DIR_SIG.to_le_bytes().to_vec();
        fake.extend_from_slice(&[0u8; 16]);
        fake.extend_from_slice(&500u16.to_le_bytes());
        let mut data = vec![0x22u8; 40];
        data.extend(eocd(&fake));
        let found = find_end_of_central_directory(&mut Cursor::new(data)).unwrap();
        assert_eq!(found, 40);
    }

    #[test]
    fn test_signature_inside_comment_across_windows() {
        // The real record lies beyond the first scan window.
        let mut comment = vec![b'c'; 3000];
        comment[2990..2994].copy_from_slice(&END_OF_CENTRAL_DIR_SIG.to_le_bytes());
        comment[100..104].copy_from_slice(&END_OF_CENTRAL_DIR_SIG.to_le_bytes());
        let mut data = vec![0u8; 700];
        data.extend(eocd(&comment));
        let found = find_end_of_central_directory(&mut Cursor::new(data)).unwrap();
        assert_eq!(found, 700);
    }

    #[test]
    fn test_only_invalid_candidates_is_malformed() {
        let mut data = vec![0u8; 100];
        data.extend_from_slice(&END_OF_CENTRAL_DIR_SIG.to_le_bytes());
        data.extend_from_slice(&[0u8; 5]);
        let err = find_end_of_central_directory(&mut Cursor::new(data)).unwrap_err();
        assert!(err.is_malformed(), "{}", err);
    }

    #[test]
    fn test_max_comment_len() {
        let mut data = vec![1u8; 64];
        data.extend(eocd(&vec![b'z'; MAX_COMMENT_LEN as usize]));
        let found = find_end_of_central_directory(&mut Cursor::new(data)).unwrap();
        assert_eq!(found, 64);
    }

    #[test]
    fn test_not_found() {
        let err = find_end_of_central_directory(&mut Cursor::new(vec![0u8; 4096])).unwrap_err();
        assert!(err.is_malformed());
        let err = find_end_of_central_directory(&mut Cursor::new(Vec::new())).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_zip64_locator_followed() {
        let mut data = Vec::new();
        data.extend_from_slice(&ZIP64_END_OF_CENTRAL_DIR_SIG.to_le_bytes());
        data.extend_from_slice(&[0u8; 52]);
        data.extend(zip64_locator(0, 0, 1));
        data.extend(eocd(b""));
        let loc = locate(&mut Cursor::new(data)).unwrap();
        assert_eq!(loc.end_offset, 76);
        assert_eq!(loc.zip64_end_offset, Some(0));
    }

    #[test]
    fn test_zip64_locator_zero_disks_accepted() {
        let mut data = Vec::new();
        data.extend_from_slice(&ZIP64_END_OF_CENTRAL_DIR_SIG.to_le_bytes());
        data.extend_from_slice(&[0u8; 52]);
        data.extend(zip64_locator(0, 0, 0));
        data.extend(eocd(b""));
        assert_eq!(find_zip64_end(&mut Cursor::new(data), 76).unwrap(), Some(0));
    }

    #[test]
    fn test_zip64_locator_spanned_rejected() {
        let mut data = Vec::new();
        data.extend_from_slice(&ZIP64_END_OF_CENTRAL_DIR_SIG.to_le_bytes());
        data.extend_from_slice(&[0u8; 52]);
        data.extend(zip64_locator(0, 0, 3));
        data.extend(eocd(b""));
        assert!(locate(&mut Cursor::new(data)).unwrap_err().is_malformed());

        let mut data = Vec::new();
        data.extend(zip64_locator(1, 0, 1));
        data.extend(eocd(b""));
        assert!(locate(&mut Cursor::new(data)).unwrap_err().is_malformed());
    }

    #[test]
    fn test_zip64_locator_bad_target() {
        let mut data = vec![0u8; 56];
        data.extend(zip64_locator(0, 0, 1));
        data.extend(eocd(b""));
        let err = locate(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, ZipError::InvalidMagic { .. }));
    }
}
