//! Utility functions for dates, log strings and output directories.
//!
//! - Date stamps in the `DD-MM-YYYY` form used by the site and the file names
//! - String truncation for logging
//! - Directory validation and cleanup before a run writes its outputs

use chrono::NaiveDate;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Format used in the daily URL and in the output file names.
pub const DATE_STAMP_FORMAT: &str = "%d-%m-%Y";

/// Render `date` as `DD-MM-YYYY`.
pub fn date_stamp(date: NaiveDate) -> String {
    date.format(DATE_STAMP_FORMAT).to_string()
}

/// Parse a `DD-MM-YYYY` date; used as a clap value parser.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_STAMP_FORMAT)
        .map_err(|e| format!("expected DD-MM-YYYY, got '{raw}': {e}"))
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes on a character boundary and
/// get `"…(+N bytes)"` appended.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Remove the files in `dir` whose extension is `extension`.
///
/// Returns how many were removed. A missing directory counts as empty;
/// individual failures are logged and skipped.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), extension))]
pub async fn clear_directory_contents(dir: &Path, extension: &str) -> std::io::Result<usize> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !matches || !entry.file_type().await?.is_file() {
            continue;
        }
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed previous output");
                removed += 1;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Could not remove previous output"),
        }
    }
    if removed > 0 {
        info!(removed, "Cleared previous outputs");
    }
    Ok(removed)
}
