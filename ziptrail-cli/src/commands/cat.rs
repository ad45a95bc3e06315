//! Cat command implementation.

use crate::utils::{GlobalOptions, open_archive};
use std::io::{self, Write};
use std::path::Path;
use ziptrail_archive::{CaseSensitivity, OpenOptions};

pub fn cmd_cat(
    archive_path: &Path,
    name: &str,
    raw: bool,
    ignore_case: bool,
    global: &GlobalOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut archive = open_archive(archive_path, global)?;

    let mode = if ignore_case {
        CaseSensitivity::Insensitive
    } else {
        CaseSensitivity::PlatformDefault
    };
    if !archive.locate_file(name, mode)? {
        return Err(format!("{}: no entry named {}", archive_path.display(), name).into());
    }

    let mut options = OpenOptions::new().raw(raw);
    if let Some(password) = &global.password {
        options = options.password(password);
    }
    archive.open_current_with(&options)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    io::copy(&mut archive.current_reader()?, &mut out)?;
    out.flush()?;
    archive.close_current()?;
    Ok(())
}
