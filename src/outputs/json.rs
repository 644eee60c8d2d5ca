//! JSON manifest of a run.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 07-03-2025.json
//! ```
//!
//! The manifest lists the articles in digest order along with any images
//! that stayed remote. It is written after the HTML and never blocks it.

use crate::models::{DigestManifest, FailedAsset, ManifestEntry, RenderedSegment};
use chrono::Utc;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Assemble the manifest for one digest.
///
/// # Arguments
///
/// * `date_stamp` - `DD-MM-YYYY` date the digest covers
/// * `source_url` - Page the articles were extracted from
/// * `page_title` - Title of that page, if it had one
/// * `articles` - Ranked articles, in digest order
/// * `failed_assets` - Images that stayed remote
///
/// # Returns
///
/// A [`DigestManifest`] stamped with the current UTC time.
pub fn build_manifest(
    date_stamp: &str,
    source_url: &str,
    page_title: Option<&str>,
    articles: &[RenderedSegment],
    failed_assets: &[FailedAsset],
) -> DigestManifest {
    DigestManifest {
        date: date_stamp.to_string(),
        source_url: source_url.to_string(),
        page_title: page_title.map(str::to_string),
        generated_at: Utc::now().to_rfc3339(),
        entries: articles.iter().map(ManifestEntry::from).collect(),
        failed_assets: failed_assets.to_vec(),
    }
}

/// Write a [`DigestManifest`] to `{json_output_dir}/{date}.json`.
///
/// # Arguments
///
/// * `manifest` - The manifest to serialize
/// * `json_output_dir` - Directory to write into, created if missing
///
/// # Returns
///
/// The path of the written file.
///
/// # Errors
///
/// Returns an error if serialization, directory creation or the write fails.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_manifest(
    manifest: &DigestManifest,
    json_output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(manifest)?;

    info!(dir = %json_output_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(dir = %json_output_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = json_output_dir.join(format!("{}.json", manifest.date));
    fs::write(&path, json).await?;
    info!(path = %path.display(), entries = manifest.entries.len(), "Wrote JSON manifest");
    Ok(path)
}
