//! ZIP Traditional (PKWARE) Encryption Support.
//!
//! This module implements decryption for the traditional ZIP stream cipher,
//! also known as ZipCrypto.
//!
//! **Security Warning**: This encryption is cryptographically weak and is
//! supported only so legacy archives can be read.
//!
//! ## Algorithm Overview
//!
//! The ZipCrypto algorithm uses:
//! - Three 32-bit keys initialized to magic values
//! - CRC-32 polynomial for key updates
//! - A 12-byte encryption header for password verification
//!
//! ## Example
//!
//! ```rust
//! use ziptrail_archive::zip::crypto::{ENCRYPTION_HEADER_SIZE, ZipCrypto};
//!
//! // The first 12 bytes of an encrypted payload, as stored in the archive.
//! let header = [0u8; ENCRYPTION_HEADER_SIZE];
//! let mut cipher = ZipCrypto::new(b"mypassword");
//! if cipher.verify_header(header, 0x5A).is_ok() {
//!     let mut payload = vec![0u8; 16];
//!     cipher.decrypt_buffer(&mut payload);
//! }
//! ```

use ziptrail_core::error::{Result, ZipError};

/// CRC-32 lookup table (polynomial 0xEDB88320, reflected).
/// The key schedule needs single-byte CRC steps.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Initial key values for ZipCrypto.
const INITIAL_KEY0: u32 = 0x12345678;
const INITIAL_KEY1: u32 = 0x23456789;
const INITIAL_KEY2: u32 = 0x34567890;

/// Size of the encryption header in bytes.
pub const ENCRYPTION_HEADER_SIZE: usize = 12;

/// ZIP Traditional (PKWARE) Encryption Cipher.
#[derive(Debug, Clone)]
pub struct ZipCrypto {
    key0: u32,
    key1: u32,
    key2: u32,
}

impl ZipCrypto {
    /// Create a cipher keyed with `password`.
    #[must_use]
    pub fn new(password: &[u8]) -> Self {
        let mut cipher = Self {
            key0: INITIAL_KEY0,
            key1: INITIAL_KEY1,
            key2: INITIAL_KEY2,
        };
        for &byte in password {
            cipher.update_keys(byte);
        }
        cipher
    }

    /// Update the key state with a plaintext byte.
    ///
    /// - key0 = crc32(key0, byte)
    /// - key1 = (key1 + (key0 & 0xff)) * 134775813 + 1
    /// - key2 = crc32(key2, key1 >> 24)
    #[inline]
    fn update_keys(&mut self, byte: u8) {
        self.key0 = crc32_update(self.key0, byte);
        self.key1 = self
            .key1
            .wrapping_add(self.key0 & 0xFF)
            .wrapping_mul(134775813)
            .wrapping_add(1);
        self.key2 = crc32_update(self.key2, (self.key1 >> 24) as u8);
    }

    /// Keystream byte: ((key2 | 2) * ((key2 | 2) ^ 1)) >> 8
    #[inline]
    fn stream_byte(&self) -> u8 {
        let temp = (self.key2 | 2) as u16;
        ((temp.wrapping_mul(temp ^ 1)) >> 8) as u8
    }

    /// Decrypt a single byte.
    #[inline]
    pub fn decrypt_byte(&mut self, byte: u8) -> u8 {
        let plain_byte = byte ^ self.stream_byte();
        self.update_keys(plain_byte);
        plain_byte
    }

    /// Decrypt a buffer in place.
    pub fn decrypt_buffer(&mut self, buffer: &mut [u8]) {
        for byte in buffer.iter_mut() {
            *byte = self.decrypt_byte(*byte);
        }
    }

    /// Decrypt the 12-byte encryption header and check its last byte.
    ///
    /// `check_byte` is the high byte of the entry CRC, or the high byte of
    /// the DOS time when the entry uses a data descriptor. On success the
    /// cipher is positioned at the first payload byte.
    pub fn verify_header(
        &mut self,
        mut header: [u8; ENCRYPTION_HEADER_SIZE],
        check_byte: u8,
    ) -> Result<()> {
        self.decrypt_buffer(&mut header);
        if header[ENCRYPTION_HEADER_SIZE - 1] != check_byte {
            return Err(ZipError::InvalidPassword);
        }
        Ok(())
    }
}

/// Update a CRC-32 value with a single byte.
#[inline]
fn crc32_update(crc: u32, byte: u8) -> u32 {
    let index = ((crc ^ byte as u32) & 0xFF) as usize;
    CRC32_TABLE[index] ^ (crc >> 8)
}
