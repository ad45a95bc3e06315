//! Info command implementation.

use crate::utils::{GlobalOptions, open_archive};
use std::path::Path;

pub fn cmd_info(
    archive_path: &Path,
    global: &GlobalOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(archive_path)?;
    let mut archive = open_archive(archive_path, global)?;
    let directory = archive.directory().clone();
    let info = archive.global_info();
    let entries = archive.entries()?;
    let comment = archive.comment()?;

    println!("Archive Information");
    println!("===================");
    println!("File: {}", archive_path.display());
    println!("Size: {} bytes", metadata.len());
    println!("ZIP64: {}", if directory.zip64 { "yes" } else { "no" });
    println!("Content offset: {}", directory.content_offset);
    println!(
        "Central directory: {} bytes at offset {}",
        directory.size, directory.offset
    );

    let total_size: u64 = entries.iter().map(|e| e.uncompressed_size).sum();
    let total_compressed: u64 = entries.iter().map(|e| e.compressed_size).sum();

    println!();
    println!("Contents:");
    println!("  Entries: {}", info.entry_count);
    println!(
        "  Files: {}",
        entries.iter().filter(|e| !e.is_dir()).count()
    );
    println!(
        "  Directories: {}",
        entries.iter().filter(|e| e.is_dir()).count()
    );
    println!(
        "  Encrypted: {}",
        entries.iter().filter(|e| e.is_encrypted()).count()
    );
    println!("  Total size: {} bytes", total_size);
    println!("  Compressed size: {} bytes", total_compressed);
    if total_size > 0 {
        println!(
            "  Compression ratio: {:.1}%",
            (1.0 - total_compressed as f64 / total_size as f64) * 100.0
        );
    }

    if !comment.is_empty() {
        println!();
        println!("Comment:");
        println!("{}", String::from_utf8_lossy(&comment));
    }

    Ok(())
}
