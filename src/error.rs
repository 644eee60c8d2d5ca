//! Error types for the digest pipeline.
//!
//! Failures fall in two groups. Run-terminating ones ([`FetchError`],
//! [`StructureError`]) end the run before any output is written and surface as
//! a [`RunError`]. Per-item ones ([`DownloadError`], [`PdfError`]) are logged
//! and recorded in the run report while the run carries on.

use std::path::PathBuf;

/// Exit code for a run that produced every artifact.
pub const EXIT_OK: u8 = 0;
/// Exit code for unexpected I/O or configuration failures.
pub const EXIT_FAILURE: u8 = 1;
/// Exit code when the source page could not be retrieved.
pub const EXIT_FETCH_FAILED: u8 = 2;
/// Exit code when the page did not have the expected article layout.
pub const EXIT_STRUCTURE_MISMATCH: u8 = 3;
/// Exit code when output was written but some assets or the PDF are missing.
pub const EXIT_DEGRADED: u8 = 4;

/// The source page could not be retrieved.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
}

/// The page was retrieved but did not contain the expected markers.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("no listing container with class '{0}'")]
    MissingListing(String),

    #[error("listing container has no direct <{0}> child")]
    MissingWrapper(String),

    #[error("no article blocks with class '{0}'")]
    NoArticles(String),

    #[error("article blocks were found but none produced content")]
    NoContent,
}

/// A single media asset could not be stored locally.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered with HTTP {0}")]
    Status(u16),

    #[error("could not write asset: {0}")]
    Io(#[from] std::io::Error),
}

/// The external PDF renderer did not produce a document.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("renderer binary '{}' not found", .0.display())]
    RendererMissing(PathBuf),

    #[error("HTML input '{}' does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("could not run renderer: {0}")]
    Io(#[from] std::io::Error),
}

/// The site profile could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("could not read profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid profile YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid base URL '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Failure that ends a run without producing output.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("could not fetch source page: {0}")]
    Fetch(#[from] FetchError),

    #[error("page structure not recognised: {0}")]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Fetch(_) => EXIT_FETCH_FAILED,
            RunError::Structure(_) => EXIT_STRUCTURE_MISMATCH,
            RunError::Profile(_) | RunError::Client(_) | RunError::Io(_) => EXIT_FAILURE,
        }
    }
}
