//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use ziptrail_archive::{ArchiveConfig, EntryRecord, LegacyEncoding, ZipArchive};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Legacy code page label for names without the UTF-8 flag.
    pub encoding: Option<String>,
    /// Password for encrypted entries.
    pub password: Option<String>,
}

/// Open an archive file with the configured legacy encoding.
pub fn open_archive(
    path: &Path,
    options: &GlobalOptions,
) -> Result<ZipArchive<BufReader<File>>, Box<dyn std::error::Error>> {
    let mut config = ArchiveConfig::new();
    if let Some(label) = &options.encoding {
        let encoding = LegacyEncoding::for_label(label)
            .ok_or_else(|| format!("unknown encoding label: {}", label))?;
        config = config.with_legacy_encoding(encoding);
    }
    let file = File::open(path)?;
    Ok(ZipArchive::open_with_config(BufReader::new(file), config)?)
}

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    match ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        Ok(style) => pb.set_style(style.progress_chars("█▓▒░ ")),
        Err(e) => tracing::debug!(error = %e, "falling back to default progress style"),
    }
    pb
}

/// Check if a filename matches the filter patterns.
/// - If include patterns are specified, the name must match at least one
/// - If exclude patterns are specified, the name must not match any
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |pattern_str: &String| {
        Pattern::new(pattern_str)
            .map(|pattern| pattern.matches(name))
            .unwrap_or(false)
    };

    if exclude.iter().any(matches) {
        return false;
    }
    include.is_empty() || include.iter().any(matches)
}

/// Filter entries based on include/exclude patterns.
pub fn filter_entries(
    entries: Vec<EntryRecord>,
    include: &[String],
    exclude: &[String],
) -> Vec<EntryRecord> {
    if include.is_empty() && exclude.is_empty() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|e| matches_filters(&e.name, include, exclude))
        .collect()
}

/// Space saved by compression, as a percentage.
pub fn savings(entry: &EntryRecord) -> Option<f64> {
    if entry.uncompressed_size == 0 {
        return None;
    }
    Some((1.0 - entry.compressed_size as f64 / entry.uncompressed_size as f64) * 100.0)
}

/// Print entries in a formatted table.
pub fn print_entries(entries: &[EntryRecord], verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", entry.name);
        }
        return;
    }

    println!(
        "{:>10} {:>10} {:>6} {:>8} {:>19} {:>8}  Name",
        "Size", "Compressed", "Ratio", "Method", "Modified", "CRC-32",
    );
    println!("{}", "-".repeat(80));

    let mut total_size = 0u64;
    let mut total_compressed = 0u64;

    for entry in entries {
        let ratio = savings(entry)
            .map(|r| format!("{:.1}%", r))
            .unwrap_or_else(|| "-".to_string());
        let marker = if entry.is_dir() {
            "d "
        } else if entry.is_encrypted() {
            "* "
        } else {
            "  "
        };

        println!(
            "{:>10} {:>10} {:>6} {:>8} {:>19} {:08x}  {}{}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio,
            entry.method.name(),
            entry.modified().to_string(),
            entry.crc32,
            marker,
            entry.name
        );

        total_size += entry.uncompressed_size;
        total_compressed += entry.compressed_size;
    }

    println!("{}", "-".repeat(80));
    let total_ratio = if total_size > 0 {
        (1.0 - total_compressed as f64 / total_size as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "{:>10} {:>10} {:>5.1}%          {} files",
        total_size,
        total_compressed,
        total_ratio,
        entries.len()
    );
}
