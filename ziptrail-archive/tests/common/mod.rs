//! Synthetic archive writer shared by the integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

const LOCAL_SIG: u32 = 0x04034B50;
const CENTRAL_SIG: u32 = 0x02014B50;
const EOCD_SIG: u32 = 0x06054B50;
const ZIP64_EOCD_SIG: u32 = 0x06064B50;
const ZIP64_LOCATOR_SIG: u32 = 0x07064B50;
const DESCRIPTOR_SIG: u32 = 0x08074B50;

/// 2024-03-15 12:34:56 in packed DOS form.
pub const SAMPLE_DATETIME: u32 = (((2024 - 1980) << 9 | 3 << 5 | 15) << 16) | (12 << 11 | 34 << 5 | 28);

pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Traditional PKWARE stream cipher, encryption direction.
struct Sealer {
    keys: [u32; 3],
}

impl Sealer {
    fn new(password: &[u8]) -> Self {
        let mut sealer = Self {
            keys: [0x12345678, 0x23456789, 0x34567890],
        };
        for &byte in password {
            sealer.update(byte);
        }
        sealer
    }

    /// One table step of CRC-32 without the pre and post inversion.
    fn crc_step(crc: u32, byte: u8) -> u32 {
        let mut hasher = crc32fast::Hasher::new_with_initial(!crc);
        hasher.update(&[byte]);
        !hasher.finalize()
    }

    fn update(&mut self, byte: u8) {
        self.keys[0] = Self::crc_step(self.keys[0], byte);
        self.keys[1] = self.keys[1]
            .wrapping_add(self.keys[0] & 0xFF)
            .wrapping_mul(134775813)
            .wrapping_add(1);
        self.keys[2] = Self::crc_step(self.keys[2], (self.keys[1] >> 24) as u8);
    }

    fn seal(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            let temp = (self.keys[2] | 2) as u16;
            let plain = *byte;
            *byte = plain ^ (temp.wrapping_mul(temp ^ 1) >> 8) as u8;
            self.update(plain);
        }
    }
}

pub fn deflate(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Compressible text of roughly `len` bytes.
pub fn text(len: usize, seed: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + 64);
    let mut i = seed;
    while out.len() < len {
        out.extend_from_slice(format!("line {} of entry {}\n", i % 313, seed).as_bytes());
        i = i.wrapping_mul(1103515245).wrapping_add(12345) >> 3;
    }
    out.truncate(len);
    out
}

/// Incompressible bytes.
pub fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2654435761).max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

#[derive(Clone)]
pub struct FixtureEntry {
    pub name: Vec<u8>,
    pub data: Vec<u8>,
    pub method: u16,
    pub level: u32,
    pub flags: u16,
    pub datetime: u32,
    pub unicode_path: Option<(String, bool)>,
    pub zip64_extra: bool,
    pub sentinel_without_extra: bool,
    pub password: Option<Vec<u8>>,
    pub data_descriptor: bool,
    pub crc_override: Option<u32>,
    pub corrupt_payload_at: Option<usize>,
    pub local_extra: Vec<u8>,
    pub comment: Vec<u8>,
    pub payload: Option<Vec<u8>>,
}

impl FixtureEntry {
    fn new(name: &str, data: &[u8], method: u16) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            data: data.to_vec(),
            method,
            level: 6,
            flags: 0,
            datetime: SAMPLE_DATETIME,
            unicode_path: None,
            zip64_extra: false,
            sentinel_without_extra: false,
            password: None,
            data_descriptor: false,
            crc_override: None,
            corrupt_payload_at: None,
            local_extra: Vec::new(),
            comment: Vec::new(),
            payload: None,
        }
    }

    pub fn stored(name: &str, data: &[u8]) -> Self {
        Self::new(name, data, 0)
    }

    pub fn deflated(name: &str, data: &[u8]) -> Self {
        Self::new(name, data, 8)
    }

    /// An entry whose payload is written verbatim; `data` only feeds the
    /// recorded size and CRC.
    pub fn precompressed(name: &str, method: u16, payload: &[u8], data: &[u8]) -> Self {
        let mut entry = Self::new(name, data, method);
        entry.payload = Some(payload.to_vec());
        entry
    }

    pub fn method(mut self, method: u16) -> Self {
        self.method = method;
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn raw_name(mut self, name: &[u8]) -> Self {
        self.name = name.to_vec();
        self
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags |= flags;
        self
    }

    pub fn utf8(self) -> Self {
        self.flags(0x0800)
    }

    pub fn unicode_path(mut self, name: &str) -> Self {
        self.unicode_path = Some((name.to_string(), true));
        self
    }

    pub fn unicode_path_bad_crc(mut self, name: &str) -> Self {
        self.unicode_path = Some((name.to_string(), false));
        self
    }

    pub fn zip64_extra(mut self) -> Self {
        self.zip64_extra = true;
        self
    }

    pub fn sentinel_without_extra(mut self) -> Self {
        self.sentinel_without_extra = true;
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.as_bytes().to_vec());
        self
    }

    pub fn data_descriptor(mut self) -> Self {
        self.data_descriptor = true;
        self
    }

    pub fn crc(mut self, crc: u32) -> Self {
        self.crc_override = Some(crc);
        self
    }

    pub fn corrupt_payload_at(mut self, index: usize) -> Self {
        self.corrupt_payload_at = Some(index);
        self
    }

    pub fn local_extra(mut self, extra: &[u8]) -> Self {
        self.local_extra = extra.to_vec();
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }
}

#[derive(Default)]
pub struct ZipFixture {
    prefix: Vec<u8>,
    entries: Vec<FixtureEntry>,
    comment: Vec<u8>,
    zip64_end: bool,
}

/// A built archive plus the absolute offsets tests patch.
pub struct BuiltZip {
    pub bytes: Vec<u8>,
    pub local_offsets: Vec<usize>,
    pub payload_offsets: Vec<usize>,
    pub compressed_sizes: Vec<u64>,
    pub directory_offset: usize,
    pub zip64_end_offset: Option<usize>,
    pub eocd_offset: usize,
}

fn put16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

impl ZipFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: &[u8]) -> Self {
        self.prefix = prefix.to_vec();
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn zip64_end(mut self) -> Self {
        self.zip64_end = true;
        self
    }

    pub fn entry(mut self, entry: FixtureEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn build_bytes(&self) -> Vec<u8> {
        self.build().bytes
    }

    pub fn build(&self) -> BuiltZip {
        let mut out = self.prefix.clone();
        let base = out.len();
        let mut local_offsets = Vec::new();
        let mut payload_offsets = Vec::new();
        let mut compressed_sizes = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let crc = entry.crc_override.unwrap_or_else(|| crc32(&entry.data));
            let mut flags = entry.flags;
            if entry.data_descriptor {
                flags |= 0x0008;
            }

            let mut payload = match (&entry.payload, entry.method) {
                (Some(payload), _) => payload.clone(),
                (None, 8) => deflate(&entry.data, entry.level),
                (None, _) => entry.data.clone(),
            };
            if let Some(i) = entry.corrupt_payload_at {
                payload[i] ^= 0x55;
            }
            if let Some(password) = &entry.password {
                flags |= 0x0001;
                let check = if entry.data_descriptor {
                    (entry.datetime >> 8) as u8
                } else {
                    (crc >> 24) as u8
                };
                let mut sealed = vec![0x3Cu8; 11];
                sealed.push(check);
                sealed.extend_from_slice(&payload);
                Sealer::new(password).seal(&mut sealed);
                payload = sealed;
            }

            let compressed = payload.len() as u64;
            let uncompressed = entry.data.len() as u64;
            let local_offset = out.len() - base;
            local_offsets.push(out.len());
            compressed_sizes.push(compressed);

            // Local header.
            put32(&mut out, LOCAL_SIG);
            put16(&mut out, if entry.zip64_extra { 45 } else { 20 });
            put16(&mut out, flags);
            put16(&mut out, entry.method);
            put32(&mut out, entry.datetime);
            if entry.data_descriptor {
                put32(&mut out, 0);
                put32(&mut out, 0);
                put32(&mut out, 0);
            } else if entry.zip64_extra {
                put32(&mut out, crc);
                put32(&mut out, u32::MAX);
                put32(&mut out, u32::MAX);
            } else {
                put32(&mut out, crc);
                put32(&mut out, compressed as u32);
                put32(&mut out, uncompressed as u32);
            }
            put16(&mut out, entry.name.len() as u16);
            put16(&mut out, entry.local_extra.len() as u16);
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(&entry.local_extra);
            payload_offsets.push(out.len());
            out.extend_from_slice(&payload);
            if entry.data_descriptor {
                put32(&mut out, DESCRIPTOR_SIG);
                put32(&mut out, crc);
                put32(&mut out, compressed as u32);
                put32(&mut out, uncompressed as u32);
            }

            // Central directory extra field.
            let mut extra = Vec::new();
            if entry.zip64_extra {
                put16(&mut extra, 0x0001);
                put16(&mut extra, 24);
                put64(&mut extra, uncompressed);
                put64(&mut extra, compressed);
                put64(&mut extra, local_offset as u64);
            }
            if let Some((name, good_crc)) = &entry.unicode_path {
                let mut name_crc = crc32(&entry.name);
                if !good_crc {
                    name_crc ^= 0xDEAD_BEEF;
                }
                put16(&mut extra, 0x7075);
                put16(&mut extra, (5 + name.len()) as u16);
                extra.push(1);
                put32(&mut extra, name_crc);
                extra.extend_from_slice(name.as_bytes());
            }

            put32(&mut central, CENTRAL_SIG);
            put16(&mut central, 3 << 8 | 20);
            put16(&mut central, if entry.zip64_extra { 45 } else { 20 });
            put16(&mut central, flags);
            put16(&mut central, entry.method);
            put32(&mut central, entry.datetime);
            put32(&mut central, crc);
            if entry.zip64_extra {
                put32(&mut central, u32::MAX);
                put32(&mut central, u32::MAX);
            } else if entry.sentinel_without_extra {
                put32(&mut central, compressed as u32);
                put32(&mut central, u32::MAX);
            } else {
                put32(&mut central, compressed as u32);
                put32(&mut central, uncompressed as u32);
            }
            put16(&mut central, entry.name.len() as u16);
            put16(&mut central, extra.len() as u16);
            put16(&mut central, entry.comment.len() as u16);
            put16(&mut central, 0);
            put16(&mut central, 0);
            put32(&mut central, 0o100644 << 16);
            put32(
                &mut central,
                if entry.zip64_extra {
                    u32::MAX
                } else {
                    local_offset as u32
                },
            );
            central.extend_from_slice(&entry.name);
            central.extend_from_slice(&extra);
            central.extend_from_slice(&entry.comment);
        }

        let directory_offset = out.len();
        let cd_offset = (directory_offset - base) as u64;
        let cd_size = central.len() as u64;
        let count = self.entries.len() as u64;
        out.extend_from_slice(&central);

        let mut zip64_end_offset = None;
        if self.zip64_end {
            let record = out.len();
            zip64_end_offset = Some(record);
            put32(&mut out, ZIP64_EOCD_SIG);
            put64(&mut out, 44);
            put16(&mut out, 45);
            put16(&mut out, 45);
            put32(&mut out, 0);
            put32(&mut out, 0);
            put64(&mut out, count);
            put64(&mut out, count);
            put64(&mut out, cd_size);
            put64(&mut out, cd_offset);

            put32(&mut out, ZIP64_LOCATOR_SIG);
            put32(&mut out, 0);
            put64(&mut out, record as u64);
            put32(&mut out, 1);
        }

        let eocd_offset = out.len();
        put32(&mut out, EOCD_SIG);
        put16(&mut out, 0);
        put16(&mut out, 0);
        if self.zip64_end {
            put16(&mut out, u16::MAX);
            put16(&mut out, u16::MAX);
            put32(&mut out, u32::MAX);
            put32(&mut out, u32::MAX);
        } else {
            put16(&mut out, count as u16);
            put16(&mut out, count as u16);
            put32(&mut out, cd_size as u32);
            put32(&mut out, cd_offset as u32);
        }
        put16(&mut out, self.comment.len() as u16);
        out.extend_from_slice(&self.comment);

        BuiltZip {
            bytes: out,
            local_offsets,
            payload_offsets,
            compressed_sizes,
            directory_offset,
            zip64_end_offset,
            eocd_offset,
        }
    }
}

/// Read the current entry fully with reads of `chunk` bytes, then close it.
pub fn read_current_in_chunks<R: std::io::Read + std::io::Seek>(
    archive: &mut ziptrail_archive::ZipArchive<R>,
    chunk: usize,
) -> ziptrail_core::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; chunk];
    loop {
        let n = archive.read_current(&mut buf)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    archive.close_current()?;
    Ok(out)
}
