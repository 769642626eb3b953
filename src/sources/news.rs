//! Top headlines from a NewsAPI compatible service.

use super::error_body;
use crate::config::Settings;
use crate::error::{DigestError, Result};
use crate::models::{NewsFeedEntry, RawFeed};
use tracing::{info, instrument, warn};

/// Fetch the current top headlines, in feed order.
///
/// Entries that fail validation are logged and dropped here, before any
/// ordinal is assigned.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `settings` - Supplies the news endpoint, API key and country
///
/// # Returns
///
/// Validated entries; an empty list is not an error.
///
/// # Errors
///
/// [`DigestError::NewsList`] if the service is unreachable, answers non-2xx,
/// or returns a body that does not parse.
#[instrument(level = "info", skip_all, fields(country = %settings.country))]
pub async fn fetch_headlines(
    client: &reqwest::Client,
    settings: &Settings,
) -> Result<Vec<NewsFeedEntry>> {
    let resp = client
        .get(&settings.endpoints.news)
        .query(&[
            ("apiKey", settings.news_api_key.as_str()),
            ("country", settings.country.as_str()),
        ])
        .send()
        .await
        .map_err(|e| DigestError::NewsList(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(DigestError::NewsList(error_body(resp).await));
    }

    let feed: RawFeed = resp
        .json()
        .await
        .map_err(|e| DigestError::NewsList(e.to_string()))?;
    let total = feed.articles.len();

    let entries: Vec<NewsFeedEntry> = feed
        .articles
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| match NewsFeedEntry::try_from(raw) {
            Ok(entry) => Some(entry),
            Err(reason) => {
                warn!(position = i, %reason, "Dropping invalid feed entry");
                None
            }
        })
        .collect();

    info!(total, valid = entries.len(), "Fetched headlines");
    Ok(entries)
}
