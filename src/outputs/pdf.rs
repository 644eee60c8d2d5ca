//! PDF rendering through an external `wkhtmltopdf`.
//!
//! The renderer reads the HTML from disk with local file access enabled, so
//! the stylesheet and `../Output Images/` references resolve the same way
//! they do in a browser.

use crate::error::PdfError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_RENDERER: &str = "wkhtmltopdf";

const RENDER_OPTIONS: &[&str] = &[
    "--page-size",
    "A4",
    "--orientation",
    "Portrait",
    "--margin-top",
    "0",
    "--margin-right",
    "0",
    "--margin-bottom",
    "0",
    "--margin-left",
    "0",
    "--encoding",
    "UTF-8",
    "--enable-local-file-access",
    "--print-media-type",
    "--disable-smart-shrinking",
    "--zoom",
    "1.1",
    "--load-error-handling",
    "ignore",
    "--dpi",
    "300",
    "--image-quality",
    "100",
];

/// Invokes the renderer binary.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    binary: PathBuf,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_RENDERER)
    }
}

impl PdfRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Full argument list for rendering `html` into `pdf`.
    pub fn arguments(&self, html: &Path, pdf: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = RENDER_OPTIONS.iter().map(OsString::from).collect();
        args.push(html.as_os_str().to_owned());
        args.push(pdf.as_os_str().to_owned());
        args
    }

    /// Render `html` into `pdf`, replacing any existing file.
    ///
    /// A non-zero exit that still left a non-empty PDF behind is logged and
    /// treated as success; the renderer exits non-zero for warnings such as
    /// unreachable images.
    ///
    /// # Arguments
    ///
    /// * `html` - The HTML digest; relative image paths resolve against it
    /// * `pdf` - Destination of the rendered file
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::MissingInput`] when `html` does not exist,
    /// [`PdfError::RendererMissing`] when the binary cannot be found, and
    /// [`PdfError::Failed`] when rendering produced no usable file.
    #[instrument(level = "info", skip_all, fields(html = %html.display(), pdf = %pdf.display()))]
    pub async fn render(&self, html: &Path, pdf: &Path) -> Result<(), PdfError> {
        if !fs::try_exists(html).await? {
            return Err(PdfError::MissingInput(html.to_path_buf()));
        }
        if fs::try_exists(pdf).await? {
            fs::remove_file(pdf).await?;
            debug!("Deleted existing PDF");
        }

        let html = std::path::absolute(html)?;
        let args = self.arguments(&html, pdf);
        debug!(binary = %self.binary.display(), args = ?args, "Running PDF renderer");

        let output = match Command::new(&self.binary).args(&args).output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PdfError::RendererMissing(self.binary.clone()));
            }
            Err(e) => return Err(PdfError::Io(e)),
        };

        if output.status.success() {
            info!("Generated PDF");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let produced = fs::metadata(pdf).await.map(|m| m.len() > 0).unwrap_or(false);
        if produced {
            warn!(status = %output.status, stderr = %stderr, "Renderer reported errors but produced a PDF");
            return Ok(());
        }
        Err(PdfError::Failed {
            status: output.status.to_string(),
            stderr,
        })
    }
}
