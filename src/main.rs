//! # Current Affairs Digest
//!
//! Turns a daily news-analysis page into a ranked, self-contained HTML
//! digest and a PDF rendering of it.
//!
//! ## Usage
//!
//! ```sh
//! current_affairs_digest --output-root ./digest --date 07-03-2025
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: Download the day's listing page
//! 2. **Extraction**: Locate article blocks, rewrite each one in place
//!    (cleanup, link absolutization, image localization) and serialize it
//! 3. **Ranking**: Order articles by their star rating
//! 4. **Output**: Write the HTML digest, its stylesheet, an optional JSON
//!    manifest and the PDF
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Every artifact was produced |
//! | 1 | I/O or configuration failure |
//! | 2 | The page could not be fetched |
//! | 3 | The page did not have the expected structure |
//! | 4 | Output written, but some images or the PDF are missing |

use chrono::Local;
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod assets;
mod cli;
mod dom;
mod error;
mod extract;
mod models;
mod outputs;
mod pipeline;
mod profile;
mod scrapers;
mod utils;

use assets::{ASSET_TIMEOUT, AssetDownloader, HttpTransport};
use cli::Cli;
use error::{EXIT_DEGRADED, EXIT_FAILURE, EXIT_OK, RunError};
use models::RunReport;
use outputs::OutputLayout;
use outputs::pdf::PdfRenderer;
use pipeline::{PublishSettings, extract, publish};
use profile::SiteProfile;
use scrapers::news_analysis::{daily_url, fetch_page};
use utils::date_stamp;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("current_affairs_digest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Early check: every output directory must be writable
    let layout = OutputLayout::under(&args.output_root);
    if let Err(e) = layout.ensure_dirs().await {
        error!(
            path = %args.output_root.display(),
            error = %e,
            "Output directories are not writable (fix perms or choose a different path)"
        );
        return ExitCode::from(EXIT_FAILURE);
    }

    let code = match run(&args, layout).await {
        Ok(report) => summarize(&report),
        Err(e) => {
            error!(error = %e, exit_code = e.exit_code(), "Run failed; no output written");
            e.exit_code()
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        exit_code = code,
        "Run finished"
    );
    ExitCode::from(code)
}

async fn run(args: &Cli, layout: OutputLayout) -> Result<RunReport, RunError> {
    let profile = match &args.profile {
        Some(path) => SiteProfile::load(path).await?,
        None => SiteProfile::default(),
    };

    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let stamp = date_stamp(date);
    let source_url = match &args.url {
        Some(url) => url.clone(),
        None => daily_url(&profile, date)?.to_string(),
    };
    info!(url = %source_url, date = %stamp, "Fetching daily page");

    let page = fetch_page(&source_url).await?;

    let transport = HttpTransport::new(ASSET_TIMEOUT)?;
    let assets = AssetDownloader::new(transport, &layout.images_dir, layout.image_href_prefix());
    let extraction = extract(&page, &profile, &assets).await?;

    let renderer = if args.no_pdf {
        None
    } else {
        let renderer = PdfRenderer::new(&args.wkhtmltopdf);
        debug!(binary = %renderer.binary().display(), "PDF rendering enabled");
        Some(renderer)
    };
    let settings = PublishSettings {
        layout,
        date_stamp: stamp,
        source_url,
        stylesheet: args.stylesheet.clone(),
        renderer,
        json_output_dir: args.json_output_dir.clone(),
    };
    publish(&extraction, &settings, &profile).await
}

/// Log the outcome of a successful run and pick its exit code.
fn summarize(report: &RunReport) -> u8 {
    info!(
        articles = report.articles,
        html = %report.html_path.display(),
        pdf = ?report.pdf_path,
        manifest = ?report.manifest_path,
        "Digest written"
    );
    if !report.is_degraded() {
        return EXIT_OK;
    }
    for failed in &report.failed_assets {
        warn!(article = failed.article, url = %failed.url, reason = %failed.reason, "Image left remote");
    }
    if let Some(pdf_error) = &report.pdf_error {
        warn!(error = %pdf_error, "PDF missing from output");
    }
    EXIT_DEGRADED
}
