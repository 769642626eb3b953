//! Error types for the digest pipeline.
//!
//! Errors are split by how far they reach:
//! - [`DigestError`]: fatal, aborts the run before any artifact is delivered
//! - [`ArticleError`]: scoped to a single article, which is dropped
//! - [`PackageError`]: raised while binding or writing the EPUB container
//! - [`DeliveryError`]: raised after the artifact exists, never rolls it back

use std::path::PathBuf;

/// Run-aborting failures.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// The settings file could not be read or parsed.
    #[error("config error: {message}")]
    Config { message: String },

    /// The geocoding service could not be reached or answered with an error.
    #[error("geocoding failed for {place:?}: {detail}")]
    Geocode { place: String, detail: String },

    /// The geocoding service answered but found nothing for the place name.
    #[error("no coordinates found for {0:?}")]
    GeocodeNoMatch(String),

    /// The weather service could not be reached or answered non-2xx.
    #[error("weather fetch failed: {0}")]
    Weather(String),

    /// The news-list service could not be reached or answered non-2xx.
    #[error("news list fetch failed: {0}")]
    NewsList(String),

    /// The EPUB container could not be built or written.
    #[error(transparent)]
    Package(#[from] PackageError),

    /// Filesystem I/O error outside the container writer.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl DigestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures confined to one article. The article is skipped and the run goes on.
#[derive(Debug, thiserror::Error)]
pub enum ArticleError {
    /// Network failure while fetching the page (or its lead image).
    #[error("fetch of {url} failed: {detail}")]
    Fetch { url: String, detail: String },

    /// The page server answered with a non-2xx status.
    #[error("fetch of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

impl ArticleError {
    pub fn fetch(url: &str, detail: impl ToString) -> Self {
        Self::Fetch {
            url: url.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Failures while binding the package or writing it to disk.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// Two chapters claimed the same identity.
    #[error("chapter {0} was added twice")]
    DuplicateChapter(String),

    /// Two assets claimed the same file name inside the container.
    #[error("asset {0} was added twice")]
    DuplicateAsset(String),

    /// Filesystem or in-memory writer failure.
    #[error("I/O error while writing package: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container rejected an entry.
    #[error("zip error while writing package: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Failures handing the finished artifact to the mail service.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The written artifact could not be read back for attaching.
    #[error("could not read attachment {path:?}: {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The request could not be built or sent.
    #[error("delivery request failed: {0}")]
    Request(String),

    /// The mail service answered with a non-2xx status.
    #[error("delivery rejected with HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Convenience alias for fatal pipeline results.
pub type Result<T> = std::result::Result<T, DigestError>;
