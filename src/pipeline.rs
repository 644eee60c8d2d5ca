//! The two halves of a run: extraction and publishing.
//!
//! [`extract`] turns the fetched page into ranked segments, downloading
//! images along the way. [`publish`] writes the HTML digest, the stylesheet,
//! the optional manifest and the optional PDF. Nothing under the HTML or PDF
//! directories is touched unless extraction produced at least one article.

use crate::assets::{AssetDownloader, Transport};
use crate::dom::Document;
use crate::error::{RunError, StructureError};
use crate::extract::segment::normalize_heading;
use crate::extract::{Rewriter, Segmenter, rank_and_assemble};
use crate::models::{FailedAsset, RenderedSegment, RunReport};
use crate::outputs::html::{provision_stylesheet, render_document, write_html_file};
use crate::outputs::json::{build_manifest, write_manifest};
use crate::outputs::pdf::PdfRenderer;
use crate::outputs::{OutputLayout, html_file_name, pdf_file_name};
use crate::profile::SiteProfile;
use crate::utils::{clear_directory_contents, truncate_for_log};
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Result of extracting one page.
#[derive(Debug)]
pub struct Extraction {
    pub page_title: Option<String>,
    /// Ranked articles, best first.
    pub articles: Vec<RenderedSegment>,
    pub failed_assets: Vec<FailedAsset>,
}

/// Everything [`publish`] needs besides the extraction itself.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub layout: OutputLayout,
    /// `DD-MM-YYYY`
    pub date_stamp: String,
    pub source_url: String,
    /// Stylesheet to copy; `None` writes the built-in one.
    pub stylesheet: Option<PathBuf>,
    /// `None` skips PDF rendering.
    pub renderer: Option<PdfRenderer>,
    pub json_output_dir: Option<PathBuf>,
}

/// Parse `page`, rewrite every article block and rank the results.
///
/// The image store is recreated on every parse, before the layout is
/// checked.
///
/// # Arguments
///
/// * `page` - Raw bytes of the daily page
/// * `profile` - Markers describing the page layout
/// * `assets` - Downloader that localizes images
///
/// # Returns
///
/// The page title, the ranked articles and the images that stayed remote.
///
/// # Errors
///
/// Returns [`RunError::Structure`] when the layout is not recognised or no
/// block yields content, and [`RunError::Io`] when the image store cannot
/// be recreated.
#[instrument(level = "info", skip_all, fields(bytes = page.len()))]
pub async fn extract<T: Transport>(
    page: &[u8],
    profile: &SiteProfile,
    assets: &AssetDownloader<T>,
) -> Result<Extraction, RunError> {
    let mut doc = Document::parse_bytes(page);

    let page_title = doc
        .find_descendant(doc.root(), |el| el.is("title"))
        .map(|t| normalize_heading(&doc.text_content(t)))
        .filter(|t| !t.is_empty());
    match &page_title {
        Some(title) => info!(title = %truncate_for_log(title, 120), "Parsed page"),
        None => warn!("Page has no title"),
    }

    assets.reset_store().await?;
    let mut segmenter = Segmenter::locate(&doc, profile)?;
    let mut rewriter = Rewriter::new(profile, assets)?;

    let mut segments = Vec::new();
    while let Some(segment) = segmenter.next_segment(&mut doc, &mut rewriter).await {
        segments.push(segment);
    }
    if segments.is_empty() {
        return Err(StructureError::NoContent.into());
    }

    let failed_assets = rewriter.into_failures();
    info!(
        blocks = segmenter.len(),
        articles = segments.len(),
        failed_assets = failed_assets.len(),
        "Extracted articles"
    );
    Ok(Extraction {
        page_title,
        articles: rank_and_assemble(segments),
        failed_assets,
    })
}

/// Write the outputs for `extraction`.
///
/// Only the HTML document is mandatory. Manifest and PDF failures are logged
/// and reflected in the report.
///
/// # Arguments
///
/// * `extraction` - Result of [`extract`]
/// * `settings` - Output layout, date and optional outputs
/// * `profile` - Supplies the credit line of the document
///
/// # Returns
///
/// A [`RunReport`] listing what was written.
///
/// # Errors
///
/// Returns [`RunError::Io`] if the directories, the stylesheet or the HTML
/// document cannot be written.
#[instrument(level = "info", skip_all, fields(date = %settings.date_stamp, articles = extraction.articles.len()))]
pub async fn publish(
    extraction: &Extraction,
    settings: &PublishSettings,
    profile: &SiteProfile,
) -> Result<RunReport, RunError> {
    let layout = &settings.layout;
    fs::create_dir_all(&layout.html_dir).await?;
    fs::create_dir_all(&layout.pdf_dir).await?;
    clear_directory_contents(&layout.html_dir, "html").await?;
    clear_directory_contents(&layout.pdf_dir, "pdf").await?;

    provision_stylesheet(settings.stylesheet.as_deref(), &layout.html_dir).await?;

    let document = render_document(&extraction.articles, &settings.date_stamp, profile);
    let html_path = write_html_file(
        &layout.html_dir,
        &html_file_name(&settings.date_stamp),
        &document,
    )
    .await?;

    let manifest_path = match &settings.json_output_dir {
        Some(dir) => {
            let manifest = build_manifest(
                &settings.date_stamp,
                &settings.source_url,
                extraction.page_title.as_deref(),
                &extraction.articles,
                &extraction.failed_assets,
            );
            match write_manifest(&manifest, dir).await {
                Ok(path) => Some(path),
                Err(e) => {
                    error!(dir = %dir.display(), error = %e, "Failed to write JSON manifest");
                    None
                }
            }
        }
        None => None,
    };

    let (pdf_path, pdf_error) = match &settings.renderer {
        Some(renderer) => {
            let pdf_path = layout.pdf_dir.join(pdf_file_name(&settings.date_stamp));
            match renderer.render(&html_path, &pdf_path).await {
                Ok(()) => (Some(pdf_path), None),
                Err(e) => {
                    error!(error = %e, "PDF rendering failed; the HTML digest is still available");
                    (None, Some(e.to_string()))
                }
            }
        }
        None => {
            info!("PDF rendering disabled");
            (None, None)
        }
    };

    Ok(RunReport {
        articles: extraction.articles.len(),
        html_path,
        pdf_path,
        manifest_path,
        failed_assets: extraction.failed_assets.clone(),
        pdf_error,
    })
}
