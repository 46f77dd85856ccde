use tracing::{debug, error, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::fetchers::http::HttpClient;
use crate::fetchers::SuggestionSource;
use crate::models::{RawPlace, SuggestionRecord};
use crate::utils::constants::{MIN_QUERY_LENGTH, SEARCH_LIMIT, SEARCH_PATH, SUGGESTION_LIMIT};

/// Place lookup against a Nominatim-compatible geocoder
#[derive(Debug, Clone)]
pub struct SuggestionFetcher {
    http: HttpClient,
    request_polygon: bool,
}

impl SuggestionFetcher {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            request_polygon: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = HttpClient::new(
            settings.geocoding_base_url()?,
            settings.user_agent.as_deref(),
            settings.timeout(),
        )?;
        Ok(Self::new(http).with_polygon(settings.request_polygon))
    }

    pub fn with_polygon(mut self, request_polygon: bool) -> Self {
        self.request_polygon = request_polygon;
        self
    }

    /// Up to five candidates for `query`; empty on short input or any failure
    pub async fn suggestions(&self, query: &str) -> Vec<SuggestionRecord> {
        if !is_searchable(query) {
            return Vec::new();
        }

        debug!("Getting suggestions for: {}", query);
        match self.lookup(query, SUGGESTION_LIMIT).await {
            Ok(records) => records,
            Err(e) => {
                error!("Error fetching suggestions for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    /// Best single match for `query`, as used when the search box is submitted
    pub async fn search_location(&self, query: &str) -> Option<SuggestionRecord> {
        if !is_searchable(query) {
            return None;
        }

        debug!("Searching for: {}", query);
        match self.lookup(query, SEARCH_LIMIT).await {
            Ok(records) => {
                let found = records.into_iter().next();
                if found.is_none() {
                    debug!("No results found for '{}'", query);
                }
                found
            }
            Err(e) => {
                error!("Error searching location '{}': {}", query, e);
                None
            }
        }
    }

    async fn lookup(&self, query: &str, limit: u32) -> Result<Vec<SuggestionRecord>> {
        let url = self.http.endpoint(SEARCH_PATH, None)?;

        let mut params: Vec<(&str, String)> = vec![
            ("format", "json".to_string()),
            ("q", query.to_string()),
            ("limit", limit.to_string()),
        ];
        if self.request_polygon {
            params.push(("polygon_geojson", "1".to_string()));
        }

        let raw: Vec<RawPlace> = self
            .http
            .fetch_json(self.http.get(url).query(&params))
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|place| {
                let name = place.display_name.clone();
                SuggestionRecord::try_from(place)
                    .map_err(|e| warn!("Skipping geocoder result '{}': {}", name, e))
                    .ok()
            })
            .collect())
    }
}

impl SuggestionSource for SuggestionFetcher {
    async fn suggestions(&self, query: &str) -> Vec<SuggestionRecord> {
        SuggestionFetcher::suggestions(self, query).await
    }

    async fn search_location(&self, query: &str) -> Option<SuggestionRecord> {
        SuggestionFetcher::search_location(self, query).await
    }
}

/// Queries shorter than three characters (after trimming) never reach the network
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_is_searchable() {
        assert!(!is_searchable(""));
        assert!(!is_searchable("  ab  "));
        assert!(!is_searchable("Öl"));
        assert!(is_searchable("Kiel"));
        assert!(is_searchable(" Föh "));
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_to_empty() {
        let http = HttpClient::new("http://127.0.0.1:9", None, Duration::from_millis(200)).unwrap();
        let fetcher = SuggestionFetcher::new(http);

        assert!(fetcher.suggestions("Flensburg").await.is_empty());
        assert!(fetcher.search_location("Flensburg").await.is_none());
    }
}
