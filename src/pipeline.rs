//! End-to-end digest run: gather, resolve, assemble, write, deliver.
//!
//! Articles are processed strictly one after another in feed order. Each
//! entry's ordinal is its position in the validated feed, fixed before any
//! article is dropped.

use crate::article::ArticleBuilder;
use crate::assembler::{DocumentPackage, PackageMetadata, assemble};
use crate::config::Settings;
use crate::delivery::{Message, send_digest};
use crate::error::{DeliveryError, DigestError, Result};
use crate::extract::{HttpFetcher, JustextClassifier, ReadableExtractor, Stoplist};
use crate::models::{Asset, Ordinal, ResolvedArticle};
use crate::outputs::epub::write_epub;
use crate::outputs::templates::STYLESHEET_HREF;
use crate::resolver::ContentResolver;
use crate::sources::{fetch_forecast, fetch_headlines, geocode};
use crate::utils::ensure_writable_dir;
use crate::weather::build_weather_chapter;
use chrono::{DateTime, Local};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use tracing::{info, instrument, warn};

const BUILTIN_STYLESHEET: &str = include_str!("../assets/book_style.css");

/// A digest that has been written to disk.
#[derive(Debug)]
pub struct Digest {
    pub path: PathBuf,
    pub package: DocumentPackage,
}

/// The package stylesheet: the configured file, or the built-in one.
pub async fn load_stylesheet(settings: &Settings) -> Result<Asset> {
    let content = match &settings.stylesheet {
        Some(path) => tokio::fs::read(path)
            .await
            .map_err(|e| DigestError::io(path, e))?,
        None => BUILTIN_STYLESHEET.as_bytes().to_vec(),
    };
    Ok(Asset {
        id: "style_nav".to_string(),
        file_name: STYLESHEET_HREF.to_string(),
        media_type: "text/css".to_string(),
        content,
    })
}

/// Build the digest for `place` and write it into the output directory.
///
/// # Arguments
///
/// * `client` - Shared HTTP client for every collaborator
/// * `settings` - Endpoints, keys, thresholds and the output directory
/// * `place` - Place name for the weather chapter
/// * `built_at` - Build time; names the package and the artifact
///
/// # Returns
///
/// The written [`Digest`]: its path plus the package that went into it.
///
/// # Errors
///
/// Any geocoding, weather, news-list, or packaging failure aborts the run
/// before an artifact exists. Per-article failures only drop that article.
#[instrument(level = "info", skip_all, fields(%place, output_dir = %settings.output_dir.display()))]
pub async fn build_digest(
    client: &reqwest::Client,
    settings: &Settings,
    place: &str,
    built_at: DateTime<Local>,
) -> Result<Digest> {
    ensure_writable_dir(&settings.output_dir)
        .await
        .map_err(|e| DigestError::io(&settings.output_dir, e))?;

    let coords = geocode(client, settings, place).await?;
    let report = fetch_forecast(client, settings, coords).await?;
    let weather = build_weather_chapter(place, &report);

    let entries = fetch_headlines(client, settings).await?;
    let total = entries.len();

    let builder = ArticleBuilder::new(
        ReadableExtractor::new(HttpFetcher::new(client.clone())),
        HttpFetcher::new(client.clone()),
        ContentResolver::new(
            HttpFetcher::new(client.clone()),
            JustextClassifier,
            Stoplist::english(),
        ),
        settings,
    );

    let results: Vec<Option<ResolvedArticle>> = stream::iter(entries.into_iter().enumerate())
        .then(|(i, entry)| builder.build(entry, Ordinal(i)))
        .collect()
        .await;
    let articles: Vec<ResolvedArticle> = results.into_iter().flatten().collect();
    info!(
        total,
        accepted = articles.len(),
        skipped = total - articles.len(),
        "Completed article processing"
    );

    let stylesheet = load_stylesheet(settings).await?;
    let metadata = PackageMetadata::for_build(built_at);
    let path = settings.output_dir.join(metadata.file_name());
    let package = assemble(metadata, weather, articles, stylesheet)?;
    write_epub(&package, &path).await?;

    info!(path = %path.display(), ordinals = ?package.spine_ordinals(), "Digest saved");
    Ok(Digest { path, package })
}

/// Email the written digest, then remove it if `delete_after` is set.
///
/// The file is only removed once the mail service has accepted it.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `settings` - Mail service settings
/// * `digest` - The artifact returned by [`build_digest`]
/// * `recipients` - Addresses as given on the command line
/// * `delete_after` - Remove the file after a confirmed send
///
/// # Errors
///
/// Any [`DeliveryError`] from sending. A failed removal is only logged.
#[instrument(level = "info", skip_all, fields(path = %digest.path.display(), delete_after = delete_after))]
pub async fn deliver(
    client: &reqwest::Client,
    settings: &Settings,
    digest: &Digest,
    recipients: &[String],
    delete_after: bool,
) -> std::result::Result<(), DeliveryError> {
    let message = Message::for_digest(&digest.package.metadata.built_at, recipients);
    send_digest(client, settings, &message, &digest.path).await?;

    if delete_after {
        match tokio::fs::remove_file(&digest.path).await {
            Ok(()) => info!("Deleted ebook file"),
            Err(e) => warn!(error = %e, "Could not delete ebook file"),
        }
    }
    Ok(())
}
