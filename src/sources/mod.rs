//! Clients for the external data services.
//!
//! - [`geocode`]: place name to coordinates (Nominatim)
//! - [`forecast`]: coordinates to forecast (Dark Sky)
//! - [`news`]: top headlines (NewsAPI)
//!
//! All three failures are fatal to a run, so every client returns
//! [`DigestError`](crate::error::DigestError).

pub mod forecast;
pub mod geocode;
pub mod news;

pub use forecast::fetch_forecast;
pub use geocode::{Coordinates, geocode};
pub use news::fetch_headlines;

/// Reads an error body for inclusion in a message, without failing twice.
pub(crate) async fn error_body(resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    format!(
        "{}: {}",
        status,
        crate::utils::truncate_for_log(body.trim(), 200)
    )
}
