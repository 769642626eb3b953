//! Document assembly.
//!
//! [`DocumentBuilder`] is the only owner of package state while a digest is
//! being put together. It takes the weather chapter and stylesheet up front,
//! accepts resolved articles in arrival order, and [`DocumentBuilder::finalize`]
//! produces an immutable [`DocumentPackage`] with its table of contents and
//! spine.
//!
//! Shape of every package:
//!
//! ```text
//! toc:   [weather link, "Articles" section -> one link per article]
//! spine: [nav, weather, article..]
//! ```
//!
//! Articles keep their ordinal; dropped articles leave gaps, nothing is
//! renumbered.

use crate::error::PackageError;
use crate::models::{Asset, ChapterKey, ChapterRecord, Ordinal, ResolvedArticle};
use crate::outputs::templates::{self, LANGUAGE, TemplateData};
use chrono::{DateTime, Local, Utc};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

pub const ARTICLES_SECTION: &str = "Articles";
pub const AUTHOR: &str = "News eBook Creator";

/// Identifying metadata of a package, derived from the build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub identifier: String,
    pub title: String,
    pub language: String,
    pub author: String,
    pub built_at: DateTime<Local>,
}

impl PackageMetadata {
    pub fn for_build(built_at: DateTime<Local>) -> Self {
        Self {
            identifier: format!("ebook_news_{}", built_at.timestamp()),
            title: built_at.format("News Update (%m/%d/%y, %I:%M%p)").to_string(),
            language: LANGUAGE.to_string(),
            author: AUTHOR.to_string(),
            built_at,
        }
    }

    /// File name of the written artifact.
    pub fn file_name(&self) -> String {
        format!("news_update_{}.epub", self.built_at.timestamp())
    }

    /// `dcterms:modified` value.
    pub fn modified(&self) -> String {
        self.built_at
            .with_timezone(&Utc)
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()
    }
}

/// A navigable link to a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocLink {
    pub href: String,
    pub title: String,
    pub id: String,
}

impl TocLink {
    fn for_chapter(key: ChapterKey, title: String) -> Self {
        Self {
            href: key.file_name(),
            title,
            id: key.id(),
        }
    }
}

/// Table of contents node. Sections only nest one level deep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocNode {
    Link(TocLink),
    Section { title: String, children: Vec<TocLink> },
}

/// One entry of the reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpineItem {
    /// The generated navigation document.
    Nav,
    Chapter(ChapterKey),
}

/// The finished, immutable package handed to the container writer.
#[derive(Debug, Clone)]
pub struct DocumentPackage {
    pub metadata: PackageMetadata,
    /// Weather first, then articles in ordinal order.
    pub chapters: Vec<ChapterRecord>,
    /// Stylesheet first, then article images in ordinal order.
    pub assets: Vec<Asset>,
    pub toc: Vec<TocNode>,
    pub spine: Vec<SpineItem>,
}

impl DocumentPackage {
    /// Article ordinals in reading order.
    pub fn spine_ordinals(&self) -> Vec<Ordinal> {
        self.spine
            .iter()
            .filter_map(|item| match item {
                SpineItem::Chapter(ChapterKey::Article(ordinal)) => Some(*ordinal),
                _ => None,
            })
            .collect()
    }

    /// Links under the "Articles" section, in order.
    pub fn article_links(&self) -> &[TocLink] {
        self.toc
            .iter()
            .find_map(|node| match node {
                TocNode::Section { title, children } if title == ARTICLES_SECTION => {
                    Some(children.as_slice())
                }
                _ => None,
            })
            .unwrap_or(&[])
    }
}

struct ArticleChapter {
    ordinal: Ordinal,
    chapter: ChapterRecord,
    toc_title: String,
}

/// Single-owner accumulator for a [`DocumentPackage`].
pub struct DocumentBuilder {
    metadata: PackageMetadata,
    weather: ChapterRecord,
    articles: Vec<ArticleChapter>,
    assets: Vec<Asset>,
    seen_chapters: HashSet<ChapterKey>,
    seen_assets: HashSet<String>,
}

impl DocumentBuilder {
    pub fn new(metadata: PackageMetadata, weather: ChapterRecord, stylesheet: Asset) -> Self {
        let mut seen_chapters = HashSet::new();
        seen_chapters.insert(weather.key);
        let mut seen_assets = HashSet::new();
        seen_assets.insert(stylesheet.file_name.clone());

        Self {
            metadata,
            weather,
            articles: Vec::new(),
            assets: vec![stylesheet],
            seen_chapters,
            seen_assets,
        }
    }

    /// Render an accepted article into its chapter and collect its image.
    ///
    /// Articles may arrive in any order; [`finalize`](Self::finalize) sorts
    /// them by ordinal.
    ///
    /// # Arguments
    ///
    /// * `article` - An article that passed content resolution.
    ///
    /// # Errors
    ///
    /// * [`PackageError::DuplicateChapter`] if an article with the same
    ///   ordinal was already added.
    /// * [`PackageError::DuplicateAsset`] if its lead image file name is
    ///   already taken.
    ///
    /// Nothing is recorded when an error is returned.
    pub fn add_article(&mut self, article: ResolvedArticle) -> Result<(), PackageError> {
        let key = ChapterKey::Article(article.ordinal);
        if self.seen_chapters.contains(&key) {
            return Err(PackageError::DuplicateChapter(key.file_name()));
        }
        if let Some(image) = &article.image {
            if !self.seen_assets.insert(image.file_name.clone()) {
                return Err(PackageError::DuplicateAsset(image.file_name.clone()));
            }
        }
        self.seen_chapters.insert(key);

        let markup = templates::render(&TemplateData::Article {
            entry: &article.entry,
            content: &article.content,
            image: article.image.as_ref().map(|i| i.file_name.as_str()),
        });
        debug!(ordinal = %article.ordinal, bytes = markup.len(), "Rendered article chapter");

        self.articles.push(ArticleChapter {
            ordinal: article.ordinal,
            toc_title: format!("{} - {}", article.entry.title, article.entry.source),
            chapter: ChapterRecord {
                key,
                title: article.entry.title,
                markup,
            },
        });
        if let Some(image) = article.image {
            self.assets.push(image);
        }
        Ok(())
    }

    /// Number of articles accepted so far.
    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    /// Bind everything into the final package.
    #[instrument(level = "info", skip_all, fields(articles = self.article_count()))]
    pub fn finalize(mut self) -> DocumentPackage {
        self.articles.sort_by_key(|a| a.ordinal);

        let article_links = self
            .articles
            .iter()
            .map(|a| TocLink::for_chapter(a.chapter.key, a.toc_title.clone()))
            .collect();
        let toc = vec![
            TocNode::Link(TocLink::for_chapter(
                self.weather.key,
                self.weather.title.clone(),
            )),
            TocNode::Section {
                title: ARTICLES_SECTION.to_string(),
                children: article_links,
            },
        ];

        let mut spine = vec![SpineItem::Nav, SpineItem::Chapter(self.weather.key)];
        spine.extend(
            self.articles
                .iter()
                .map(|a| SpineItem::Chapter(a.chapter.key)),
        );

        let mut chapters = vec![self.weather];
        chapters.extend(self.articles.into_iter().map(|a| a.chapter));

        info!(spine = spine.len(), assets = self.assets.len(), "Package bound");
        DocumentPackage {
            metadata: self.metadata,
            chapters,
            assets: self.assets,
            toc,
            spine,
        }
    }
}

/// Assemble a package from a weather chapter and accepted articles.
///
/// # Arguments
///
/// * `metadata` - Identity of the package, derived from the build time.
/// * `weather` - The weather chapter, always first after the nav document.
/// * `articles` - Accepted articles; an empty list is valid.
/// * `stylesheet` - The stylesheet shared by every chapter.
///
/// # Returns
///
/// The bound [`DocumentPackage`], ready for the container writer.
///
/// # Errors
///
/// Fails on the first duplicate chapter or asset; see
/// [`DocumentBuilder::add_article`].
pub fn assemble(
    metadata: PackageMetadata,
    weather: ChapterRecord,
    articles: Vec<ResolvedArticle>,
    stylesheet: Asset,
) -> Result<DocumentPackage, PackageError> {
    let mut builder = DocumentBuilder::new(metadata, weather, stylesheet);
    for article in articles {
        builder.add_article(article)?;
    }
    Ok(builder.finalize())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{NewsFeedEntry, Outcome, WeatherReport};
    use crate::weather::build_weather_chapter;
    use chrono::TimeZone;

    pub(crate) fn metadata() -> PackageMetadata {
        PackageMetadata::for_build(Local.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    pub(crate) fn stylesheet() -> Asset {
        Asset {
            id: "style_nav".to_string(),
            file_name: "style/nav.css".to_string(),
            media_type: "text/css".to_string(),
            content: b"body { margin: 0; }".to_vec(),
        }
    }

    pub(crate) fn article(ordinal: usize, with_image: bool) -> ResolvedArticle {
        ResolvedArticle {
            ordinal: Ordinal(ordinal),
            entry: NewsFeedEntry {
                source: format!("Source {ordinal}"),
                author: None,
                title: format!("Title {ordinal}"),
                top_image: None,
                description: String::new(),
                url: format!("https://example.com/{ordinal}"),
            },
            content: "<p>Body.</p>".to_string(),
            outcome: Outcome::PrimaryAccepted,
            image: with_image.then(|| Asset {
                id: format!("image_{:03}", ordinal),
                file_name: format!("art_img/image_{:03}.jpg", ordinal),
                media_type: "image/jpeg".to_string(),
                content: vec![0xff, 0xd8],
            }),
        }
    }

    pub(crate) fn weather() -> ChapterRecord {
        build_weather_chapter("Chicago", &WeatherReport::default())
    }

    fn toc_ordinals(package: &DocumentPackage) -> Vec<String> {
        package.article_links().iter().map(|l| l.id.clone()).collect()
    }

    #[test]
    fn test_metadata_naming() {
        let meta = metadata();
        assert_eq!(meta.identifier, "ebook_news_1700000000");
        assert_eq!(meta.file_name(), "news_update_1700000000.epub");
        assert_eq!(meta.language, "en");
        assert_eq!(meta.author, "News eBook Creator");
        assert!(meta.title.starts_with("News Update ("));
        assert_eq!(meta.modified(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_empty_article_list_yields_nav_and_weather() {
        let package = assemble(metadata(), weather(), vec![], stylesheet()).unwrap();

        assert_eq!(
            package.spine,
            vec![SpineItem::Nav, SpineItem::Chapter(ChapterKey::Weather)]
        );
        assert_eq!(package.chapters.len(), 1);
        assert!(package.article_links().is_empty());
        assert_eq!(package.toc.len(), 2);
        assert_eq!(package.assets.len(), 1);
    }

    #[test]
    fn test_gapped_ordinals_are_kept() {
        let articles = vec![article(0, false), article(3, true), article(7, false)];
        let package = assemble(metadata(), weather(), articles, stylesheet()).unwrap();

        assert_eq!(package.spine.len(), 2 + 3);
        assert_eq!(
            package.spine_ordinals(),
            vec![Ordinal(0), Ordinal(3), Ordinal(7)]
        );
        assert_eq!(toc_ordinals(&package), vec!["art0", "art3", "art7"]);
        assert_eq!(package.article_links()[1].href, "article_3.xhtml");
        assert_eq!(package.article_links()[1].title, "Title 3 - Source 3");
        assert_eq!(package.assets[1].file_name, "art_img/image_003.jpg");
        assert!(package.chapters[2].markup.contains("art_img/image_003.jpg"));
    }

    #[test]
    fn test_toc_layout() {
        let package = assemble(metadata(), weather(), vec![article(1, false)], stylesheet()).unwrap();
        match &package.toc[0] {
            TocNode::Link(link) => {
                assert_eq!(link.href, "weather.xhtml");
                assert_eq!(link.title, "Current Weather");
                assert_eq!(link.id, "weather00");
            }
            other => panic!("expected weather link, got {other:?}"),
        }
        match &package.toc[1] {
            TocNode::Section { title, children } => {
                assert_eq!(title, "Articles");
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected articles section, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_order_arrivals_are_sorted() {
        let articles = vec![article(5, false), article(2, false)];
        let package = assemble(metadata(), weather(), articles, stylesheet()).unwrap();
        assert_eq!(package.spine_ordinals(), vec![Ordinal(2), Ordinal(5)]);
        assert_eq!(toc_ordinals(&package), vec!["art2", "art5"]);
    }

    #[test]
    fn test_duplicate_article_is_rejected() {
        let mut builder = DocumentBuilder::new(metadata(), weather(), stylesheet());
        builder.add_article(article(1, false)).unwrap();
        let err = builder.add_article(article(1, false)).unwrap_err();
        assert!(matches!(err, PackageError::DuplicateChapter(name) if name == "article_1.xhtml"));
        assert_eq!(builder.article_count(), 1);
    }

    #[test]
    fn test_colliding_image_names_are_rejected() {
        let mut builder = DocumentBuilder::new(metadata(), weather(), stylesheet());
        builder.add_article(article(1, true)).unwrap();

        let mut second = article(2, true);
        if let Some(image) = second.image.as_mut() {
            image.file_name = "art_img/image_001.jpg".to_string();
        }
        let err = builder.add_article(second).unwrap_err();
        assert!(matches!(&err, PackageError::DuplicateAsset(name) if name == "art_img/image_001.jpg"));
        assert_eq!(err.to_string(), "asset art_img/image_001.jpg was added twice");
        assert_eq!(builder.article_count(), 1);

        builder.add_article(article(2, false)).unwrap();
        assert_eq!(builder.article_count(), 2);
    }

    #[test]
    fn test_spine_and_toc_agree_for_any_mix() {
        for mask in 0u32..32 {
            let articles: Vec<_> = (0..5)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| article(i, i % 2 == 0))
                .collect();
            let accepted = articles.len();
            let package = assemble(metadata(), weather(), articles, stylesheet()).unwrap();

            assert_eq!(package.spine.len(), 2 + accepted);
            assert_eq!(package.article_links().len(), accepted);
            let from_spine: Vec<String> = package
                .spine_ordinals()
                .iter()
                .map(|o| format!("art{o}"))
                .collect();
            assert_eq!(from_spine, toc_ordinals(&package));
        }
    }
}
