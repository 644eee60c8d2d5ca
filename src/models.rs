//! Data models passed between the extraction and output stages.
//!
//! - [`ArticleSegment`]: one rewritten article, in source order
//! - [`RenderedSegment`]: an article with its final position in the digest
//! - [`FailedAsset`]: an image that could not be stored locally
//! - [`DigestManifest`]: the JSON summary written next to the HTML
//! - [`RunReport`]: what a run produced, used to pick the exit code

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One article extracted from the daily page.
///
/// `fragments` are serialized HTML pieces in document order. The first one
/// is the heading when the article had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSegment {
    /// Zero-based position of the block on the source page.
    pub index: usize,
    /// Whitespace-normalized heading text.
    pub heading: Option<String>,
    /// Number of filled rating markers; 0 when the article has no widget.
    pub rank_score: usize,
    /// Serialized HTML pieces.
    pub fragments: Vec<String>,
}

/// An article placed in the final digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSegment {
    /// Zero-based position in the digest.
    pub position: usize,
    pub segment: ArticleSegment,
}

/// An image left pointing at its remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAsset {
    /// Index of the article the image belongs to.
    pub article: usize,
    /// Absolute URL that was requested.
    pub url: String,
    /// Why the download did not succeed.
    pub reason: String,
}

/// Per-article line of the JSON manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub position: usize,
    pub index: usize,
    pub heading: Option<String>,
    pub rank_score: usize,
    pub fragments: usize,
}

impl From<&RenderedSegment> for ManifestEntry {
    fn from(rendered: &RenderedSegment) -> Self {
        Self {
            position: rendered.position,
            index: rendered.segment.index,
            heading: rendered.segment.heading.clone(),
            rank_score: rendered.segment.rank_score,
            fragments: rendered.segment.fragments.len(),
        }
    }
}

/// Machine-readable summary of one digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestManifest {
    /// `DD-MM-YYYY` date the digest covers.
    pub date: String,
    pub source_url: String,
    /// `<title>` of the source page, whitespace-normalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    /// RFC 3339 timestamp of generation.
    pub generated_at: String,
    pub entries: Vec<ManifestEntry>,
    pub failed_assets: Vec<FailedAsset>,
}

/// Outcome of a run that wrote its HTML document.
#[derive(Debug)]
pub struct RunReport {
    pub articles: usize,
    pub html_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
    pub failed_assets: Vec<FailedAsset>,
    /// Set when PDF rendering was requested and did not succeed.
    pub pdf_error: Option<String>,
}

impl RunReport {
    /// Whether some images or the PDF are missing from the output.
    pub fn is_degraded(&self) -> bool {
        !self.failed_assets.is_empty() || self.pdf_error.is_some()
    }
}
