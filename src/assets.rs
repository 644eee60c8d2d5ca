//! Local asset store for article images.
//!
//! Images referenced by rewritten articles are copied into the image output
//! directory and referenced from the HTML through a fixed relative prefix
//! (`../Output Images/...`). File names depend only on the article index and
//! a per-article sequence number:
//!
//! ```text
//! article_<index>_img_<n>.<ext>
//! ```
//!
//! A file that already exists under the computed name is reused without a
//! network request. That makes the skip keyed on the local path, not on the
//! remote content.

use crate::error::DownloadError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// User agent sent with image requests.
pub const ASSET_USER_AGENT: &str = "Mozilla/5.0";

/// Per-request timeout for image downloads.
pub const ASSET_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_EXTENSION: &str = "jpg";

static EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{1,5}$").expect("extension pattern compiles"));

/// Byte source for remote assets.
///
/// The HTTP implementation is [`HttpTransport`]; tests substitute an
/// in-memory one.
pub trait Transport {
    /// Stream the body at `url` into `sink`, returning the bytes written.
    async fn copy_to<W>(&self, url: &str, sink: &mut W) -> Result<u64, DownloadError>
    where
        W: AsyncWrite + Unpin;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(ASSET_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn copy_to<W>(&self, url: &str, sink: &mut W) -> Result<u64, DownloadError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;
        Ok(written)
    }
}

/// Per-article image sequence numbers for one extraction run.
#[derive(Debug, Default)]
pub struct ImageCounters(HashMap<usize, u32>);

impl ImageCounters {
    /// Next sequence number for `article`, starting at 1.
    pub fn next(&mut self, article: usize) -> u32 {
        let counter = self.0.entry(article).or_insert(0);
        *counter += 1;
        *counter
    }
}

/// Best-effort file extension for a remote image, without the dot.
///
/// Tries the URL path first, then a `format` query parameter, then falls
/// back to `jpg`.
pub fn infer_extension(remote_url: &str) -> String {
    let Ok(url) = Url::parse(remote_url) else {
        return DEFAULT_EXTENSION.to_string();
    };

    let from_path = url
        .path_segments()
        .and_then(|segments| segments.last())
        .and_then(|name| name.rsplit_once('.'))
        .filter(|(stem, _)| !stem.is_empty())
        .map(|(_, ext)| ext)
        .filter(|ext| EXTENSION.is_match(ext));
    if let Some(ext) = from_path {
        return ext.to_string();
    }

    url.query_pairs()
        .find(|(key, _)| key == "format")
        .map(|(_, value)| value.into_owned())
        .filter(|ext| EXTENSION.is_match(ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Local file name for the `sequence`-th image of `article`.
pub fn asset_file_name(remote_url: &str, article: usize, sequence: u32) -> String {
    format!(
        "article_{article}_img_{sequence}.{}",
        infer_extension(remote_url)
    )
}

/// Downloads images into the asset store for one run.
#[derive(Debug)]
pub struct AssetDownloader<T> {
    transport: T,
    store_dir: PathBuf,
    href_prefix: String,
}

impl<T: Transport> AssetDownloader<T> {
    /// `store_dir` is where files are written; `href_prefix` is how the HTML
    /// output refers to that directory.
    pub fn new(transport: T, store_dir: impl Into<PathBuf>, href_prefix: impl Into<String>) -> Self {
        Self {
            transport,
            store_dir: store_dir.into(),
            href_prefix: href_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether `src` already points into the asset store.
    pub fn is_local(&self, src: &str) -> bool {
        src.starts_with(&format!("{}/", self.href_prefix))
    }

    /// Delete and recreate the store directory.
    #[instrument(level = "info", skip_all, fields(dir = %self.store_dir.display()))]
    pub async fn reset_store(&self) -> std::io::Result<()> {
        if fs::try_exists(&self.store_dir).await? {
            fs::remove_dir_all(&self.store_dir).await?;
        }
        fs::create_dir_all(&self.store_dir).await?;
        info!("Recreated image directory");
        Ok(())
    }

    /// Store `remote_url` as image `sequence` of `article`.
    ///
    /// A file already present under the computed name is reused without a
    /// request. A failed transfer removes the partial file.
    ///
    /// # Arguments
    ///
    /// * `remote_url` - Absolute URL of the image
    /// * `article` - Index of the article the image belongs to
    /// * `sequence` - One-based position of the image within the article
    ///
    /// # Returns
    ///
    /// The path to the stored file as the HTML output refers to it, e.g.
    /// `../Output Images/article_2_img_1.jpg`.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] if the transfer or a filesystem operation
    /// fails.
    #[instrument(level = "debug", skip(self, remote_url), fields(url = %remote_url))]
    pub async fn fetch_asset(
        &self,
        remote_url: &str,
        article: usize,
        sequence: u32,
    ) -> Result<String, DownloadError> {
        let file_name = asset_file_name(remote_url, article, sequence);
        let destination = self.store_dir.join(&file_name);
        let href = format!("{}/{}", self.href_prefix, file_name);

        fs::create_dir_all(&self.store_dir).await?;
        if fs::try_exists(&destination).await? {
            debug!(path = %destination.display(), "Image already present; reusing");
            return Ok(href);
        }

        let mut file = fs::File::create(&destination).await?;
        match self.transport.copy_to(remote_url, &mut file).await {
            Ok(bytes) => {
                info!(file = %file_name, bytes, "Downloaded image");
                Ok(href)
            }
            Err(e) => {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&destination).await {
                    warn!(path = %destination.display(), error = %cleanup, "Could not remove partial image");
                }
                Err(e)
            }
        }
    }
}
