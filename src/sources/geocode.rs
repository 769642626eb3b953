//! Place name geocoding against a Nominatim server.

use super::error_body;
use crate::config::Settings;
use crate::error::{DigestError, Result};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{info, instrument};

/// A resolved location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Nominatim returns coordinates as decimal strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Look up `place` and return the coordinates of the best match.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `settings` - Supplies the geocoding endpoint and user agent
/// * `place` - Free-form place name, as typed on the command line
///
/// # Errors
///
/// [`DigestError::GeocodeNoMatch`] when the server finds nothing, and
/// [`DigestError::Geocode`] for transport, status, or payload failures.
#[instrument(level = "info", skip_all, fields(%place))]
pub async fn geocode(client: &reqwest::Client, settings: &Settings, place: &str) -> Result<Coordinates> {
    let failed = |detail: String| DigestError::Geocode {
        place: place.to_string(),
        detail,
    };

    let url = format!(
        "{}?q={}&format=json&limit=1",
        settings.endpoints.geocode,
        urlencoding::encode(place)
    );
    let resp = client
        .get(&url)
        .header(USER_AGENT, &settings.nominatim_user_agent)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(failed(error_body(resp).await));
    }

    let places: Vec<Place> = resp.json().await.map_err(|e| failed(e.to_string()))?;
    let best = places
        .into_iter()
        .next()
        .ok_or_else(|| DigestError::GeocodeNoMatch(place.to_string()))?;

    let parse = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|e| failed(format!("bad coordinate {value:?}: {e}")))
    };
    let coords = Coordinates {
        latitude: parse(&best.lat)?,
        longitude: parse(&best.lon)?,
    };
    info!(lat = coords.latitude, lon = coords.longitude, "Geocoded place");
    Ok(coords)
}
