//! Data models flowing through the digest pipeline.
//!
//! - [`NewsFeedEntry`]: one validated headline from the news-list service
//! - [`ResolvedArticle`]: an entry whose body passed content resolution
//! - [`WeatherReport`]: the forecast payload for the requested place
//! - [`ChapterRecord`]: the common shape the document assembler consumes
//!
//! Wire shapes ([`RawFeedArticle`], the Dark Sky blocks) are deserialized
//! leniently and converted into the typed records at the service boundary.

use serde::Deserialize;
use std::fmt;

/// Stable identity of an article, assigned once at ingestion from its
/// position in the news feed and never renumbered after drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ordinal(pub usize);

impl Ordinal {
    /// Zero-padded form used for asset names (`007`).
    pub fn padded(&self) -> String {
        format!("{:03}", self.0)
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A headline as returned by the news-list service, after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsFeedEntry {
    /// Display name of the publishing outlet.
    pub source: String,
    pub author: Option<String>,
    pub title: String,
    /// Lead image URL, if the feed supplied one.
    pub top_image: Option<String>,
    pub description: String,
    /// Canonical article URL.
    pub url: String,
}

/// Wire shape of one item in the NewsAPI `articles` array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFeedArticle {
    #[serde(default)]
    pub source: RawFeedSource,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFeedSource {
    pub name: Option<String>,
}

/// Wire shape of the NewsAPI top-headlines response.
#[derive(Debug, Deserialize)]
pub struct RawFeed {
    #[serde(default)]
    pub articles: Vec<RawFeedArticle>,
}

/// NewsAPI replaces withdrawn stories with this literal.
const REMOVED_MARKER: &str = "[Removed]";

impl TryFrom<RawFeedArticle> for NewsFeedEntry {
    type Error = &'static str;

    fn try_from(raw: RawFeedArticle) -> Result<Self, Self::Error> {
        let title = non_blank(raw.title).ok_or("missing title")?;
        let url = non_blank(raw.url).ok_or("missing url")?;
        if title == REMOVED_MARKER {
            return Err("removed by publisher");
        }
        if url::Url::parse(&url).is_err() {
            return Err("url is not absolute");
        }

        Ok(Self {
            source: non_blank(raw.source.name).unwrap_or_else(|| "Unknown".to_string()),
            author: non_blank(raw.author),
            title,
            top_image: non_blank(raw.url_to_image),
            description: non_blank(raw.description).unwrap_or_default(),
            url,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Terminal classification of an article's content resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    PrimaryAccepted,
    FallbackAccepted,
    Rejected,
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Outcome::Rejected)
    }
}

/// A binary asset bundled into the package (image or stylesheet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Manifest id, unique within the package.
    pub id: String,
    /// Path relative to the package content directory.
    pub file_name: String,
    pub media_type: String,
    pub content: Vec<u8>,
}

/// An article that passed content resolution and will become a chapter.
#[derive(Debug, Clone)]
pub struct ResolvedArticle {
    pub ordinal: Ordinal,
    pub entry: NewsFeedEntry,
    /// Body markup: a sequence of `<p>` elements.
    pub content: String,
    pub outcome: Outcome,
    /// Lead image, present only if it was retrieved successfully.
    pub image: Option<Asset>,
}

/// Identity of a chapter inside the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChapterKey {
    Weather,
    Article(Ordinal),
}

impl ChapterKey {
    pub fn file_name(&self) -> String {
        match self {
            ChapterKey::Weather => "weather.xhtml".to_string(),
            ChapterKey::Article(ordinal) => format!("article_{}.xhtml", ordinal),
        }
    }

    /// Manifest id, also used as the TOC anchor id.
    pub fn id(&self) -> String {
        match self {
            ChapterKey::Weather => "weather00".to_string(),
            ChapterKey::Article(ordinal) => format!("art{}", ordinal),
        }
    }
}

/// A rendered chapter: identity, XHTML document, and human-readable title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    pub key: ChapterKey,
    pub title: String,
    pub markup: String,
}

/// The Dark Sky forecast for the requested place.
///
/// Every block is optional so partial payloads still render.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherReport {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub currently: Option<WeatherPoint>,
    #[serde(default)]
    pub hourly: Option<WeatherBlock>,
    #[serde(default)]
    pub daily: Option<WeatherBlock>,
}

impl WeatherReport {
    pub fn from_json(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(raw)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherBlock {
    pub summary: Option<String>,
    #[serde(default)]
    pub data: Vec<WeatherPoint>,
}

/// One observation or forecast point. Times are UNIX seconds.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherPoint {
    pub time: Option<i64>,
    pub summary: Option<String>,
    pub temperature: Option<f64>,
    pub apparentTemperature: Option<f64>,
    pub temperatureHigh: Option<f64>,
    pub temperatureLow: Option<f64>,
    pub humidity: Option<f64>,
    pub windSpeed: Option<f64>,
    pub windBearing: Option<f64>,
    pub precipProbability: Option<f64>,
}
