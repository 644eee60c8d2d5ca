//! Output generation: the HTML digest, its PDF rendering and a JSON manifest.
//!
//! # Submodules
//!
//! - [`html`]: assembles the standalone HTML document and its stylesheet
//! - [`pdf`]: renders the HTML to PDF with an external `wkhtmltopdf`
//! - [`json`]: writes a machine-readable manifest of the run
//!
//! # Output Structure
//!
//! ```text
//! output_root/
//! ├── Output Images/
//! │   └── article_0_img_1.jpg
//! ├── Output Html/
//! │   ├── 07-03-2025.html    # refers to ../Output Images/...
//! │   └── styles.css
//! └── Output Pdf/
//!     └── Today (07-03-2025).pdf
//! ```

pub mod html;
pub mod json;
pub mod pdf;

use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::path::{Path, PathBuf};

pub const IMAGES_DIR_NAME: &str = "Output Images";
pub const HTML_DIR_NAME: &str = "Output Html";
pub const PDF_DIR_NAME: &str = "Output Pdf";

/// `<dd-mm-yyyy>.html`
pub fn html_file_name(date_stamp: &str) -> String {
    format!("{date_stamp}.html")
}

/// `Today (<dd-mm-yyyy>).pdf`
pub fn pdf_file_name(date_stamp: &str) -> String {
    format!("Today ({date_stamp}).pdf")
}

/// Where a run writes its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub images_dir: PathBuf,
    pub html_dir: PathBuf,
    pub pdf_dir: PathBuf,
}

impl OutputLayout {
    /// The standard three directories under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            images_dir: root.join(IMAGES_DIR_NAME),
            html_dir: root.join(HTML_DIR_NAME),
            pdf_dir: root.join(PDF_DIR_NAME),
        }
    }

    /// How the HTML document refers to the image directory.
    pub fn image_href_prefix(&self) -> String {
        format!("../{IMAGES_DIR_NAME}")
    }

    /// Create every directory and check that it is writable.
    pub async fn ensure_dirs(&self) -> Result<(), Box<dyn Error>> {
        for dir in [&self.images_dir, &self.html_dir, &self.pdf_dir] {
            ensure_writable_dir(dir).await?;
        }
        Ok(())
    }
}
