//! Entry name normalization.
//!
//! A central directory record stores its name as raw bytes. The bytes are
//! UTF-8 when flag bit 11 is set; otherwise they are in a legacy code page
//! chosen by the writer (CP437 for classic DOS tools). An Info-ZIP Unicode
//! path extra field can supersede the raw name, but only when its stored
//! CRC-32 matches the raw name: a mismatch means the raw name was changed
//! after the extra field was written, so the raw name wins.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::Encoding;
use tracing::debug;

use ziptrail_core::crc::Crc32;

use super::extra::UnicodePath;
use super::header::FLAG_UTF8;

/// CP437 code points for bytes 0x80-0xFF.
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{A0}',
];

/// Code page used for names that are not flagged as UTF-8.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub enum LegacyEncoding {
    /// IBM PC code page 437, the historical ZIP default.
    #[default]
    Cp437,
    /// Any encoding known to `encoding_rs` (Shift_JIS, windows-1252, GBK, ...).
    Other(&'static Encoding),
}

impl LegacyEncoding {
    /// Look up an encoding by label.
    ///
    /// Accepts `cp437`, `ibm437` and `437` in addition to every WHATWG label
    /// understood by `encoding_rs`. Labels are case-insensitive.
    pub fn for_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if ["cp437", "ibm437", "437"]
            .iter()
            .any(|alias| trimmed.eq_ignore_ascii_case(alias))
        {
            return Some(Self::Cp437);
        }
        Encoding::for_label(trimmed.as_bytes()).map(Self::Other)
    }

    /// Canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cp437 => "IBM437",
            Self::Other(encoding) => encoding.name(),
        }
    }

    /// Decode legacy bytes to a string. Unmappable bytes become U+FFFD.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            Self::Cp437 => {
                if bytes.is_ascii() {
                    // ASCII bytes are valid UTF-8.
                    String::from_utf8_lossy(bytes)
                } else {
                    Cow::Owned(
                        bytes
                            .iter()
                            .map(|&b| {
                                if b < 0x80 {
                                    b as char
                                } else {
                                    CP437_HIGH[(b - 0x80) as usize]
                                }
                            })
                            .collect(),
                    )
                }
            }
            Self::Other(encoding) => encoding.decode_without_bom_handling(bytes).0,
        }
    }
}

impl fmt::Debug for LegacyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LegacyEncoding({})", self.name())
    }
}

/// Where a resolved name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    /// The raw name, flagged as UTF-8.
    Utf8,
    /// A Unicode path extra field whose checksum matched the raw name.
    UnicodeExtra,
    /// The raw name, recoded from the legacy code page.
    Legacy,
}

/// Produce the display name for a record.
pub fn resolve_name(
    raw: &[u8],
    flags: u16,
    unicode_path: Option<&UnicodePath>,
    legacy: &LegacyEncoding,
) -> (String, NameSource) {
    if let Some(path) = unicode_path {
        let computed = Crc32::compute(raw);
        if computed == path.name_crc {
            return (
                String::from_utf8_lossy(&path.name).into_owned(),
                NameSource::UnicodeExtra,
            );
        }
        debug!(
            name = %String::from_utf8_lossy(raw),
            stored = format_args!("{:#010x}", path.name_crc),
            computed = format_args!("{:#010x}", computed),
            "Unicode path checksum mismatch; keeping the stored name"
        );
    }

    if flags & FLAG_UTF8 != 0 {
        (String::from_utf8_lossy(raw).into_owned(), NameSource::Utf8)
    } else {
        (legacy.decode(raw).into_owned(), NameSource::Legacy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cp437_decode() {
        let enc = LegacyEncoding::Cp437;
        assert_eq!(enc.decode(b"plain.txt"), "plain.txt");
        // 0x82 = é, 0x94 = ö, 0xE1 = ß
        assert_eq!(enc.decode(&[b'a', 0x82, 0x94, 0xE1]), "aéöß");
        assert_eq!(enc.decode(&[0xFF]), "\u{A0}");
    }

    #[test]
    fn test_for_label() {
        assert_eq!(LegacyEncoding::for_label("CP437"), Some(LegacyEncoding::Cp437));
        assert_eq!(LegacyEncoding::for_label(" ibm437 "), Some(LegacyEncoding::Cp437));
        let sjis = LegacyEncoding::for_label("shift_jis").unwrap();
        assert_eq!(sjis.name(), "Shift_JIS");
        assert!(LegacyEncoding::for_label("no-such-encoding").is_none());
        assert_eq!(LegacyEncoding::default().name(), "IBM437");
    }

    #[test]
    fn test_other_encoding_decode() {
        let sjis = LegacyEncoding::for_label("shift_jis").unwrap();
        // "日本" in Shift_JIS
        assert_eq!(sjis.decode(&[0x93, 0xFA, 0x96, 0x7B]), "日本");
    }

    #[test]
    fn test_resolve_utf8_flag() {
        let (name, source) = resolve_name(
            "naïve.txt".as_bytes(),
            FLAG_UTF8,
            None,
            &LegacyEncoding::Cp437,
        );
        assert_eq!(name, "naïve.txt");
        assert_eq!(source, NameSource::Utf8);
    }

    #[test]
    fn test_resolve_legacy() {
        let (name, source) = resolve_name(&[0x84, b'.', b'c'], 0, None, &LegacyEncoding::Cp437);
        assert_eq!(name, "ä.c");
        assert_eq!(source, NameSource::Legacy);
    }

    #[test]
    fn test_resolve_unicode_extra_match() {
        let raw = [b'r', 0x82, b's'];
        let path = UnicodePath {
            name_crc: Crc32::compute(&raw),
            name: "résumé".as_bytes().to_vec(),
        };
        let (name, source) = resolve_name(&raw, 0, Some(&path), &LegacyEncoding::Cp437);
        assert_eq!(name, "résumé");
        assert_eq!(source, NameSource::UnicodeExtra);
    }

    #[test]
    fn test_resolve_unicode_extra_mismatch_falls_back() {
        let raw = b"old-name.txt";
        let path = UnicodePath {
            name_crc: Crc32::compute(b"something else"),
            name: "new-name.txt".as_bytes().to_vec(),
        };
        let (name, source) = resolve_name(raw, 0, Some(&path), &LegacyEncoding::Cp437);
        assert_eq!(name, "old-name.txt");
        assert_eq!(source, NameSource::Legacy);
    }
}
