//! Article record builder.
//!
//! Turns one feed entry into a [`ResolvedArticle`], or nothing:
//!
//! 1. Titles containing an excluded keyword are dropped before any fetch.
//! 2. The primary extractor runs; a failed fetch counts as empty text.
//! 3. The [`ContentResolver`] accepts, falls back, or rejects.
//! 4. The lead image, if any, is fetched and embedded. Failing that, the
//!    article simply goes without an image.
//!
//! Every failure past step 1 is confined to this article.

use crate::config::Settings;
use crate::extract::{BoilerplateClassifier, PageFetcher, PrimaryExtractor};
use crate::models::{Asset, NewsFeedEntry, Ordinal, ResolvedArticle};
use crate::resolver::ContentResolver;
use crate::utils::{image_extension, image_media_type, title_contains_any};
use tracing::{info, instrument, warn};
use url::Url;

/// Builds [`ResolvedArticle`]s from feed entries, one at a time.
#[derive(Debug)]
pub struct ArticleBuilder<P, I, F, B> {
    primary: P,
    images: I,
    resolver: ContentResolver<F, B>,
    title_exclusions: Vec<String>,
    min_paragraphs: usize,
}

impl<P, I, F, B> ArticleBuilder<P, I, F, B>
where
    P: PrimaryExtractor,
    I: PageFetcher,
    F: PageFetcher,
    B: BoilerplateClassifier,
{
    pub fn new(
        primary: P,
        images: I,
        resolver: ContentResolver<F, B>,
        settings: &Settings,
    ) -> Self {
        Self {
            primary,
            images,
            resolver,
            title_exclusions: settings.title_exclusions.clone(),
            min_paragraphs: settings.min_paragraphs,
        }
    }

    /// Build the article at `ordinal`, or `None` if it was excluded or rejected.
    #[instrument(level = "info", skip_all, fields(ordinal = %ordinal, source = %entry.source))]
    pub async fn build(&self, entry: NewsFeedEntry, ordinal: Ordinal) -> Option<ResolvedArticle> {
        info!(title = %entry.title, "Loading article");

        if title_contains_any(&entry.title, &self.title_exclusions) {
            info!("Article title contains a barred keyword; skipping");
            return None;
        }

        let raw_text = match self.primary.extract(&entry.url).await {
            Ok(text) => text,
            Err(e) => {
                warn!(url = %entry.url, error = %e, "Primary extraction failed; treating as empty");
                String::new()
            }
        };

        let resolution = match self
            .resolver
            .resolve(&raw_text, &entry.url, self.min_paragraphs)
            .await
        {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(url = %entry.url, error = %e, "Fallback fetch failed; skipping article");
                return None;
            }
        };

        let content = match resolution.content {
            Some(content) if resolution.outcome.is_accepted() => content,
            _ => {
                warn!(url = %entry.url, "Article is too short even after fallback; skipping");
                return None;
            }
        };

        let image = match entry.top_image.as_deref() {
            Some(image_url) => self.fetch_image(&entry.url, image_url, ordinal).await,
            None => None,
        };

        info!(outcome = ?resolution.outcome, has_image = image.is_some(), "Article accepted");
        Some(ResolvedArticle {
            ordinal,
            entry,
            content,
            outcome: resolution.outcome,
            image,
        })
    }

    /// Fetch the lead image and package it as `art_img/image_<NNN>.<ext>`.
    async fn fetch_image(&self, page_url: &str, image_url: &str, ordinal: Ordinal) -> Option<Asset> {
        let resolved = match Url::parse(page_url).and_then(|base| base.join(image_url)) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(%image_url, error = %e, "Lead image URL is unusable; continuing without it");
                return None;
            }
        };

        let page = match self.images.fetch(&resolved).await {
            Ok(page) if !page.bytes.is_empty() => page,
            Ok(_) => {
                warn!(image_url = %resolved, "Lead image is empty; continuing without it");
                return None;
            }
            Err(e) => {
                warn!(image_url = %resolved, error = %e, "Lead image unavailable; continuing without it");
                return None;
            }
        };

        let media_type = image_media_type(page.content_type.as_deref(), &page.bytes);
        let stem = format!("image_{}", ordinal.padded());
        Some(Asset {
            file_name: format!("art_img/{}.{}", stem, image_extension(media_type)),
            id: stem,
            media_type: media_type.to_string(),
            content: page.bytes,
        })
    }
}
