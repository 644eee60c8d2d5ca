//! Standalone HTML digest.
//!
//! The document links a `styles.css` placed next to it and refers to images
//! through `../Output Images/`, so the HTML directory and the image directory
//! must stay siblings.

use crate::models::RenderedSegment;
use crate::profile::SiteProfile;
use html_escape::encode_text;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Name of the stylesheet next to the HTML file.
pub const STYLESHEET_FILE_NAME: &str = "styles.css";

/// Shipped with the binary; used when no `--stylesheet` is given.
pub const DEFAULT_STYLESHEET: &str = include_str!("../../assets/styles.css");

const EMPTY_NOTICE: &str = "<p>No article data was extracted.</p>";

/// Build the full HTML document for `articles`.
///
/// # Arguments
///
/// * `articles` - Ranked articles, in digest order
/// * `date_stamp` - `DD-MM-YYYY` date shown in the page heading
/// * `profile` - Supplies the credit line
///
/// # Returns
///
/// The complete document, with a notice in place of the articles when there
/// are none.
pub fn render_document(articles: &[RenderedSegment], date_stamp: &str, profile: &SiteProfile) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html lang=\"en\">\n");
    html.push_str("<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str("    <title>Scraped Articles</title>\n");
    html.push_str(&format!(
        "    <link rel=\"stylesheet\" type=\"text/css\" href=\"{STYLESHEET_FILE_NAME}\">\n"
    ));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("    <h1>Current Affairs {}</h1>\n", encode_text(date_stamp)));
    html.push_str(&format!("    <h3>Credit - {}</h3>\n", encode_text(&profile.credit)));

    if articles.is_empty() {
        html.push_str(&format!("    {EMPTY_NOTICE}\n"));
    }
    for (i, rendered) in articles.iter().enumerate() {
        html.push_str(&format!(
            "    <div class=\"article-container\" id=\"article-sorted-{}\">\n",
            rendered.position
        ));
        html.push_str(&rendered.segment.fragments.join("\n"));
        html.push_str("\n    </div>\n");
        if i + 1 < articles.len() {
            html.push_str("    <hr>\n");
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Write `document` to `html_dir/file_name`, replacing any previous file.
#[instrument(level = "info", skip_all, fields(dir = %html_dir.display(), file = %file_name))]
pub async fn write_html_file(
    html_dir: &Path,
    file_name: &str,
    document: &str,
) -> std::io::Result<PathBuf> {
    let path = html_dir.join(file_name);
    if fs::try_exists(&path).await? {
        fs::remove_file(&path).await?;
        info!(path = %path.display(), "Deleted existing HTML file");
    }
    fs::write(&path, document).await?;
    info!(path = %path.display(), bytes = document.len(), "Wrote HTML digest");
    Ok(path)
}

/// Place the stylesheet next to the HTML file.
///
/// With a `source` path, that file is copied; a missing source is a warning
/// and returns `Ok(false)`. Without one, the built-in stylesheet is written.
#[instrument(level = "info", skip_all, fields(dir = %html_dir.display()))]
pub async fn provision_stylesheet(source: Option<&Path>, html_dir: &Path) -> std::io::Result<bool> {
    let destination = html_dir.join(STYLESHEET_FILE_NAME);
    match source {
        Some(source) => {
            if !fs::try_exists(source).await? {
                warn!(path = %source.display(), "Stylesheet not found; HTML will be unstyled");
                return Ok(false);
            }
            fs::copy(source, &destination).await?;
            info!(from = %source.display(), to = %destination.display(), "Copied stylesheet");
        }
        None => {
            fs::write(&destination, DEFAULT_STYLESHEET).await?;
            info!(to = %destination.display(), "Wrote built-in stylesheet");
        }
    }
    Ok(true)
}
