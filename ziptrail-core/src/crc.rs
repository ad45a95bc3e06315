//! CRC-32 (ISO 3309) checksums.
//!
//! ZIP records the CRC-32 of every entry's uncompressed data, and the
//! Unicode-path extra field carries the CRC-32 of the legacy filename. Both
//! are computed with the standard reflected polynomial `0xEDB88320`.
//!
//! The table-driven work is delegated to `crc32fast`, which picks a
//! hardware-accelerated implementation when the CPU offers one. [`Crc32`]
//! wraps it in the incremental accumulator shape used throughout the
//! workspace.

use crc32fast::Hasher;

/// CRC-32 calculator (ISO 3309).
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value: 0xFFFFFFFF
/// - Final XOR: 0xFFFFFFFF
///
/// # Example
///
/// ```
/// use ziptrail_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, ");
/// crc.update(b"World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
/// ```
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: Hasher,
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32").finish_non_exhaustive()
    }
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
        }
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finalize and return the CRC value.
    #[inline]
    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}
