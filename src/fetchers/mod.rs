//! HTTP fetchers and the traits the controllers use to reach them.
//!
//! Fetchers never hand transport, status or payload errors to UI code: they
//! log and degrade to an empty result or `None`. The station-bounds lookup is
//! the exception, returning `Result` so a failed refresh can keep stale markers.

pub mod geocoding;
pub mod http;
pub mod mosmix;

pub use geocoding::{is_searchable, SuggestionFetcher};
pub use http::HttpClient;
pub use mosmix::MosmixClient;

use std::future::Future;

use crate::error::Result;
use crate::models::{Bounds, ForecastPayload, StationMarker, SuggestionRecord};

pub trait SuggestionSource: Send + Sync + 'static {
    fn suggestions(&self, query: &str) -> impl Future<Output = Vec<SuggestionRecord>> + Send;

    fn search_location(&self, query: &str)
        -> impl Future<Output = Option<SuggestionRecord>> + Send;
}

pub trait ForecastSource: Send + Sync + 'static {
    fn forecast(&self, station_id: &str) -> impl Future<Output = Option<ForecastPayload>> + Send;
}

pub trait StationSource: Send + Sync + 'static {
    fn stations_in(&self, bounds: Bounds) -> impl Future<Output = Result<Vec<StationMarker>>> + Send;
}
