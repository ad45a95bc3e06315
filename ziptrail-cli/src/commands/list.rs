//! List command implementation.

use crate::utils::{GlobalOptions, filter_entries, open_archive, print_entries, savings};
use serde::Serialize;
use std::path::Path;
use ziptrail_archive::EntryRecord;

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize)]
struct EntryJson {
    name: String,
    size: u64,
    compressed_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ratio: Option<f64>,
    method: String,
    crc: u32,
    modified: String,
    is_dir: bool,
    encrypted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unix_mode: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    comment: String,
}

impl EntryJson {
    fn from_entry(entry: &EntryRecord) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.uncompressed_size,
            compressed_size: entry.compressed_size,
            ratio: savings(entry),
            method: entry.method.name().to_string(),
            crc: entry.crc32,
            modified: entry.modified().to_string(),
            is_dir: entry.is_dir(),
            encrypted: entry.is_encrypted(),
            unix_mode: entry.unix_mode(),
            comment: String::from_utf8_lossy(&entry.comment).into_owned(),
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize)]
struct ArchiveListJson {
    archive: String,
    zip64: bool,
    content_offset: u64,
    entries: Vec<EntryJson>,
}

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub verbose: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(
    archive_path: &Path,
    options: &ListOptions,
    global: &GlobalOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut archive = open_archive(archive_path, global)?;
    let entries = filter_entries(archive.entries()?, options.include, options.exclude);

    if options.json {
        let directory = archive.directory();
        let listing = ArchiveListJson {
            archive: archive_path.display().to_string(),
            zip64: directory.zip64,
            content_offset: directory.content_offset,
            entries: entries.iter().map(EntryJson::from_entry).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Archive: {}", archive_path.display());
    println!();
    print_entries(&entries, options.verbose);
    Ok(())
}
