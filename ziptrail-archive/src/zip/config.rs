//! Reader configuration.
//!
//! All knobs are explicit values handed to [`ZipArchive::open_with_config`]
//! and [`ZipArchive::open_current_with`]; nothing is read from the process
//! environment.
//!
//! [`ZipArchive::open_with_config`]: super::ZipArchive::open_with_config
//! [`ZipArchive::open_current_with`]: super::ZipArchive::open_current_with

use super::filename::LegacyEncoding;

/// Default capacity of the compressed-byte staging buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 16384;

/// How names are compared when locating an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CaseSensitivity {
    /// Byte-exact comparison.
    Sensitive,
    /// ASCII letters compare equal regardless of case.
    Insensitive,
    /// Use the archive's configured default, which in turn defaults to the
    /// platform convention (sensitive on Unix, insensitive elsewhere).
    #[default]
    PlatformDefault,
}

impl CaseSensitivity {
    /// The platform convention.
    pub fn platform() -> Self {
        if cfg!(unix) {
            Self::Sensitive
        } else {
            Self::Insensitive
        }
    }

    /// Replace `PlatformDefault` with a concrete mode.
    pub fn resolve(self, fallback: CaseSensitivity) -> Self {
        match (self, fallback) {
            (Self::PlatformDefault, Self::PlatformDefault) => Self::platform(),
            (Self::PlatformDefault, concrete) => concrete,
            (concrete, _) => concrete,
        }
    }

    /// Compare two names under this mode.
    pub fn names_equal(self, a: &str, b: &str) -> bool {
        match self.resolve(Self::PlatformDefault) {
            Self::Insensitive => a.eq_ignore_ascii_case(b),
            _ => a == b,
        }
    }
}

/// Archive-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Code page for names without the UTF-8 flag.
    pub legacy_encoding: LegacyEncoding,
    /// Mode substituted for [`CaseSensitivity::PlatformDefault`] lookups.
    pub case_sensitivity: CaseSensitivity,
    /// Compressed-byte staging buffer capacity (at least 1).
    pub read_buffer_size: usize,
}

impl ArchiveConfig {
    /// Configuration with all defaults.
    pub fn new() -> Self {
        Self {
            legacy_encoding: LegacyEncoding::default(),
            case_sensitivity: CaseSensitivity::PlatformDefault,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    /// Set the legacy code page.
    pub fn with_legacy_encoding(mut self, encoding: LegacyEncoding) -> Self {
        self.legacy_encoding = encoding;
        self
    }

    /// Set the default lookup mode.
    pub fn with_case_sensitivity(mut self, mode: CaseSensitivity) -> Self {
        self.case_sensitivity = mode;
        self
    }

    /// Set the staging buffer capacity; zero is raised to one.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for one entry-read session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Return the compressed bytes verbatim instead of decompressing.
    pub raw: bool,
    /// Password for entries encrypted with the legacy PKWARE cipher.
    pub password: Option<Vec<u8>>,
}

impl OpenOptions {
    /// Decompressing, unencrypted session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable raw passthrough.
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Supply a password.
    pub fn password(mut self, password: impl AsRef<[u8]>) -> Self {
        self.password = Some(password.as_ref().to_vec());
        self
    }
}
