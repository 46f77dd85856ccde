use tracing::{debug, error, info};

use crate::config::Settings;
use crate::error::Result;
use crate::fetchers::http::HttpClient;
use crate::fetchers::{ForecastSource, StationSource};
use crate::models::{markers_from_collection, Bounds, FeatureCollection, ForecastPayload, StationMarker};
use crate::utils::constants::{BOUNDS_PATH, FORECAST_PATH};

/// Client for the MOSMIX forecast and station-bounds endpoints
#[derive(Debug, Clone)]
pub struct MosmixClient {
    http: HttpClient,
}

impl MosmixClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = HttpClient::new(
            settings.api_base_url()?,
            settings.user_agent.as_deref(),
            settings.timeout(),
        )?;
        Ok(Self::new(http))
    }

    /// Raw forecast for a station; `None` when it could not be fetched or decoded
    pub async fn forecast(&self, station_id: &str) -> Option<ForecastPayload> {
        match self.try_forecast(station_id).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                error!("Error fetching forecast data for station {}: {}", station_id, e);
                None
            }
        }
    }

    pub async fn try_forecast(&self, station_id: &str) -> Result<ForecastPayload> {
        let url = self.http.endpoint(FORECAST_PATH, Some(station_id))?;
        debug!("Fetching forecast data from: {}", url);
        self.http.fetch_json(self.http.get(url)).await
    }

    /// Stations inside `bounds`; errors are returned so callers can keep stale markers
    pub async fn stations_in(&self, bounds: Bounds) -> Result<Vec<StationMarker>> {
        let url = self.http.endpoint(BOUNDS_PATH, None)?;
        debug!("Fetching markers from: {} {:?}", url, bounds);

        let collection: FeatureCollection = self
            .http
            .fetch_json(self.http.get(url).query(&bounds.query_params()))
            .await?;

        let markers = markers_from_collection(collection);
        if markers.is_empty() {
            info!("No stations found in the current viewport");
        }
        Ok(markers)
    }
}

impl ForecastSource for MosmixClient {
    async fn forecast(&self, station_id: &str) -> Option<ForecastPayload> {
        MosmixClient::forecast(self, station_id).await
    }
}

impl StationSource for MosmixClient {
    async fn stations_in(&self, bounds: Bounds) -> Result<Vec<StationMarker>> {
        MosmixClient::stations_in(self, bounds).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;

    #[test]
    fn test_from_settings_requires_api_url() {
        let result = MosmixClient::from_settings(&Settings::default());
        assert!(matches!(result, Err(MapError::Config(_))));

        let settings = Settings::default().with_api_base_url("https://api.example.org");
        assert!(MosmixClient::from_settings(&settings).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_api_yields_no_data() {
        let settings = Settings {
            timeout_secs: 1,
            ..Settings::default().with_api_base_url("http://127.0.0.1:9")
        };
        let client = MosmixClient::from_settings(&settings).unwrap();

        assert!(client.forecast("10155").await.is_none());
        let bounds = Bounds::new(9.0, 54.0, 10.0, 55.0).unwrap();
        assert!(client.stations_in(bounds).await.is_err());
    }
}
