//! Forecast retrieval from a Dark Sky compatible API.

use super::error_body;
use crate::config::Settings;
use crate::error::{DigestError, Result};
use crate::models::WeatherReport;
use crate::sources::Coordinates;
use tracing::{info, instrument};

/// Fetch the forecast at `coords`.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `settings` - Supplies the weather endpoint and API key
/// * `coords` - Location returned by [`geocode`](crate::sources::geocode)
///
/// # Returns
///
/// The typed [`WeatherReport`]; blocks missing from the payload are `None`.
///
/// # Errors
///
/// [`DigestError::Weather`] if the service is unreachable, answers non-2xx,
/// or returns a body that is not a forecast.
#[instrument(level = "info", skip_all, fields(lat = coords.latitude, lon = coords.longitude))]
pub async fn fetch_forecast(
    client: &reqwest::Client,
    settings: &Settings,
    coords: Coordinates,
) -> Result<WeatherReport> {
    let url = format!(
        "{}/{}/{},{}",
        settings.endpoints.weather, settings.weather_api_key, coords.latitude, coords.longitude
    );
    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| DigestError::Weather(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(DigestError::Weather(error_body(resp).await));
    }

    let raw: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| DigestError::Weather(e.to_string()))?;
    let report = WeatherReport::from_json(raw).map_err(|e| DigestError::Weather(e.to_string()))?;
    info!(
        timezone = report.timezone.as_deref().unwrap_or("unknown"),
        "Fetched forecast"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> Settings {
        let mut settings = Settings::default();
        settings.endpoints.weather = format!("{}/forecast", server.uri());
        settings.weather_api_key = "sky-key".to_string();
        settings
    }

    const COORDS: Coordinates = Coordinates {
        latitude: 41.5,
        longitude: -87.25,
    };

    #[tokio::test]
    async fn test_forecast_path_and_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast/sky-key/41.5,-87.25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "timezone": "America/Chicago",
                "currently": {"summary": "Clear", "temperature": 70.1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = fetch_forecast(&reqwest::Client::new(), &settings(&server), COORDS)
            .await
            .unwrap();
        assert_eq!(report.timezone.as_deref(), Some("America/Chicago"));
        assert_eq!(report.currently.unwrap().summary.as_deref(), Some("Clear"));
    }

    #[tokio::test]
    async fn test_forecast_rejects_bad_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let err = fetch_forecast(&reqwest::Client::new(), &settings(&server), COORDS)
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::Weather(detail) if detail.contains("403")));
    }
}
