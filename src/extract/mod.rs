//! Article text extraction.
//!
//! Extraction is split behind three seams so the content resolver can be
//! driven by fakes in tests:
//!
//! - [`PageFetcher`]: raw page download
//! - [`PrimaryExtractor`]: first-pass article text (see [`readable`])
//! - [`BoilerplateClassifier`]: block-level boilerplate labelling (see [`justext`])
//!
//! [`markup`] turns plain text into the paragraph markup stored in chapters.

pub mod justext;
pub mod markup;
pub mod readable;

use crate::error::ArticleError;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

pub use justext::{JustextClassifier, Stoplist, TextBlock};
pub use readable::ReadableExtractor;

/// A downloaded page body plus its declared media type.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Downloads raw pages.
pub trait PageFetcher {
    /// Fetch `url`. Non-2xx answers are errors.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ArticleError>;
}

impl<T: PageFetcher> PageFetcher for &T {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ArticleError> {
        (**self).fetch(url).await
    }
}

/// First-pass article text extraction. Performs its own fetch.
pub trait PrimaryExtractor {
    /// Plain text of the article body; may be empty.
    async fn extract(&self, url: &str) -> Result<String, ArticleError>;
}

/// Labels each text block of a page as boilerplate or content.
pub trait BoilerplateClassifier {
    fn classify(&self, page: &[u8], stoplist: &Stoplist) -> Vec<TextBlock>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ArticleError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ArticleError::fetch(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ArticleError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await.map_err(|e| ArticleError::fetch(url, e))?;
        debug!(bytes = bytes.len(), content_type = ?content_type, "Fetched page");

        Ok(FetchedPage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
