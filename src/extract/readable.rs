//! First-pass article extractor.
//!
//! Runs Readability (via `dom_smoothie`) over the downloaded page and returns
//! the paragraphs of the extracted article, one per blank-line separated
//! block. Works well on clean article pages; paywalls, video pages and odd
//! layouts usually come back short, which the content resolver treats as the
//! signal to fall back.

use crate::error::ArticleError;
use crate::extract::markup::collapse_whitespace;
use crate::extract::{PageFetcher, PrimaryExtractor};
use dom_smoothie::{Config, Readability};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Upper bound on parsed elements; pathological pages are cut off here.
const MAX_ELEMENTS: usize = 9000;

/// [`PrimaryExtractor`] that downloads the page and runs Readability on it.
#[derive(Debug, Clone)]
pub struct ReadableExtractor<F> {
    fetcher: F,
}

impl<F> ReadableExtractor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: PageFetcher> PrimaryExtractor for ReadableExtractor<F> {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<String, ArticleError> {
        let page = self.fetcher.fetch(url).await?;
        let html = String::from_utf8_lossy(&page.bytes);
        let text = extract_text(&html, Some(url));
        debug!(chars = text.len(), "Primary extraction done");
        Ok(text)
    }
}

/// Article paragraphs of `html`, joined by blank lines.
///
/// # Arguments
///
/// * `html` - The full page markup.
/// * `url` - Address the page was fetched from, used to resolve relative links.
///
/// # Returns
///
/// Plain text with one paragraph per block. A page Readability cannot make
/// sense of yields an empty string rather than an error.
pub fn extract_text(html: &str, url: Option<&str>) -> String {
    let cfg = Config {
        max_elements_to_parse: MAX_ELEMENTS,
        ..Default::default()
    };

    let article = match Readability::new(html, url, Some(cfg)).and_then(|mut r| r.parse()) {
        Ok(article) => article,
        Err(e) => {
            debug!(error = %e, "Readability found no article");
            return String::new();
        }
    };

    let content = Html::parse_fragment(&article.content);
    content
        .select(&PARAGRAPH)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
