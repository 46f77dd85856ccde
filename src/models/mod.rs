pub mod coordinate;
pub mod forecast;
pub mod lenient;
pub mod station;
pub mod suggestion;

pub use coordinate::{Bounds, Coordinate};
pub use forecast::{ForecastPayload, ForecastSample, ForecastSeries, StationSeries};
pub use station::{markers_from_collection, ClusterSize, FeatureCollection, StationMarker};
pub use suggestion::{RawPlace, SourceRef, SuggestionRecord};
