//! Content resolution: decide whether an article body is good enough.
//!
//! The primary extractor's text is split into paragraphs. Enough paragraphs
//! and it is accepted as-is. Too few usually means a paywall, a video page or
//! a layout the primary extractor misread, so the page is fetched again and
//! run through the boilerplate classifier. If that still yields too few
//! content blocks the article really is short and gets rejected.
//!
//! There is exactly one fallback attempt and no retry.

use crate::error::ArticleError;
use crate::extract::markup::{render_paragraphs, to_markup};
use crate::extract::{BoilerplateClassifier, PageFetcher, Stoplist};
use crate::models::Outcome;
use tracing::{info, instrument, warn};

/// Result of resolving one article body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Paragraph markup; `None` when rejected.
    pub content: Option<String>,
    pub outcome: Outcome,
}

impl Resolution {
    fn rejected() -> Self {
        Self {
            content: None,
            outcome: Outcome::Rejected,
        }
    }
}

/// Resolves article bodies, falling back to boilerplate removal on short text.
#[derive(Debug)]
pub struct ContentResolver<F, B> {
    fetcher: F,
    classifier: B,
    stoplist: Stoplist,
}

impl<F, B> ContentResolver<F, B>
where
    F: PageFetcher,
    B: BoilerplateClassifier,
{
    pub fn new(fetcher: F, classifier: B, stoplist: Stoplist) -> Self {
        Self {
            fetcher,
            classifier,
            stoplist,
        }
    }

    /// Resolve `raw_primary_text` for the article at `source_url`.
    ///
    /// # Errors
    ///
    /// Only the fallback fetch can fail. The error is scoped to this article.
    #[instrument(level = "info", skip_all, fields(%source_url, min_paragraphs = min_paragraphs))]
    pub async fn resolve(
        &self,
        raw_primary_text: &str,
        source_url: &str,
        min_paragraphs: usize,
    ) -> Result<Resolution, ArticleError> {
        let paragraphs = render_paragraphs(raw_primary_text);
        if paragraphs.len() >= min_paragraphs {
            info!(paragraphs = paragraphs.len(), "Primary extraction accepted");
            return Ok(Resolution {
                content: Some(to_markup(&paragraphs)),
                outcome: Outcome::PrimaryAccepted,
            });
        }

        warn!(
            paragraphs = paragraphs.len(),
            "Article too short; it may be paywalled, a video, or parsed incorrectly. Falling back"
        );
        let page = self.fetcher.fetch(source_url).await?;
        let kept: Vec<String> = self
            .classifier
            .classify(&page.bytes, &self.stoplist)
            .into_iter()
            .filter(|block| !block.is_boilerplate)
            .map(|block| block.text)
            .collect();

        if kept.len() < min_paragraphs {
            info!(
                paragraphs = kept.len(),
                "Fallback agrees the article is short; rejecting"
            );
            return Ok(Resolution::rejected());
        }

        info!(paragraphs = kept.len(), "Fallback extraction accepted");
        Ok(Resolution {
            content: Some(to_markup(&kept)),
            outcome: Outcome::FallbackAccepted,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extract::{FetchedPage, TextBlock};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves one canned page (or an error) and counts fetches.
    #[derive(Debug, Default)]
    pub(crate) struct FakeFetcher {
        pub page: Option<FetchedPage>,
        pub calls: AtomicUsize,
    }

    impl FakeFetcher {
        pub(crate) fn serving(body: &str) -> Self {
            Self {
                page: Some(FetchedPage {
                    bytes: body.as_bytes().to_vec(),
                    content_type: None,
                }),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing() -> Self {
            Self::default()
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, ArticleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.page.clone().ok_or_else(|| ArticleError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    /// Treats each line of the page as a block; lines starting with `#` are boilerplate.
    #[derive(Debug, Default, Clone, Copy)]
    pub(crate) struct LineClassifier;

    impl BoilerplateClassifier for LineClassifier {
        fn classify(&self, page: &[u8], _stoplist: &Stoplist) -> Vec<TextBlock> {
            String::from_utf8_lossy(page)
                .lines()
                .map(|line| TextBlock {
                    text: line.trim_start_matches('#').to_string(),
                    is_boilerplate: line.starts_with('#'),
                })
                .collect()
        }
    }

    pub(crate) fn paragraphs(n: usize) -> String {
        (1..=n)
            .map(|i| format!("Paragraph {i}."))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn resolver(fetcher: &FakeFetcher) -> ContentResolver<&FakeFetcher, LineClassifier> {
        ContentResolver::new(fetcher, LineClassifier, Stoplist::english())
    }

    #[tokio::test]
    async fn test_primary_accepted_without_fallback_fetch() {
        let fetcher = FakeFetcher::serving("unused");
        let resolution = resolver(&fetcher)
            .resolve(&paragraphs(10), "https://example.com/a", 5)
            .await
            .unwrap();

        assert_eq!(resolution.outcome, Outcome::PrimaryAccepted);
        let expected = (1..=10)
            .map(|i| format!("<p>Paragraph {i}.</p>"))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(resolution.content.as_deref(), Some(expected.as_str()));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_exact_threshold_is_accepted() {
        let fetcher = FakeFetcher::serving("unused");
        let resolution = resolver(&fetcher)
            .resolve(&paragraphs(5), "https://example.com/a", 5)
            .await
            .unwrap();
        assert_eq!(resolution.outcome, Outcome::PrimaryAccepted);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_keeps_only_content_blocks_in_order() {
        let page = "#Menu\nOne\nTwo\n#Ad\nThree\nFour & more\nFive\nSix\n#Footer";
        let fetcher = FakeFetcher::serving(page);
        let resolution = resolver(&fetcher)
            .resolve(&paragraphs(2), "https://example.com/b", 5)
            .await
            .unwrap();

        assert_eq!(resolution.outcome, Outcome::FallbackAccepted);
        assert_eq!(
            resolution.content.as_deref(),
            Some("<p>One</p>\n<p>Two</p>\n<p>Three</p>\n<p>Four &amp; more</p>\n<p>Five</p>\n<p>Six</p>")
        );
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_still_short_after_fallback_is_rejected() {
        let fetcher = FakeFetcher::serving("#Menu\nOne\nTwo\n#Footer");
        let resolution = resolver(&fetcher)
            .resolve(&paragraphs(1), "https://example.com/c", 5)
            .await
            .unwrap();

        assert_eq!(resolution, Resolution::rejected());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_primary_text_still_tries_fallback() {
        let fetcher = FakeFetcher::serving("One\nTwo\nThree\nFour\nFive");
        let resolution = resolver(&fetcher)
            .resolve("", "https://example.com/d", 5)
            .await
            .unwrap();

        assert_eq!(resolution.outcome, Outcome::FallbackAccepted);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_fetch_failure_is_article_error() {
        let fetcher = FakeFetcher::failing();
        let err = resolver(&fetcher)
            .resolve("Too short.", "https://example.com/e", 5)
            .await
            .unwrap_err();

        assert!(matches!(err, ArticleError::Status { status: 404, .. }));
        assert_eq!(fetcher.calls(), 1);
    }
}
