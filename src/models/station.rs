use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::models::{lenient, Coordinate};
use crate::utils::constants::{DEFAULT_STATION_TITLE, NOT_AVAILABLE};

/// GeoJSON feature collection returned by the bounds endpoint.
///
/// Features stay raw so a single malformed one is skipped on its own.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: Option<FeatureId>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<StationProperties>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Text(text) => write!(f, "{}", text),
            FeatureId::Number(number) => write!(f, "{}", number),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

impl Geometry {
    /// The `[lon, lat]` position of a point geometry
    pub fn position(&self) -> Option<Vec<f64>> {
        let values = self.coordinates.as_array()?;
        values.iter().map(|v| v.as_f64()).collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationProperties {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub station_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub precipitation: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub wind_speed: Option<f64>,
}

/// A station as placed on the map for one bounds refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationMarker {
    pub station_id: Option<String>,
    pub coordinate: Coordinate,
    pub title: String,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
}

impl StationMarker {
    pub fn new(station_id: Option<String>, coordinate: Coordinate, title: String) -> Self {
        Self {
            station_id,
            coordinate,
            title,
            temperature: None,
            precipitation: None,
            wind_speed: None,
        }
    }

    pub fn with_readings(
        mut self,
        temperature: Option<f64>,
        precipitation: Option<f64>,
        wind_speed: Option<f64>,
    ) -> Self {
        self.temperature = temperature;
        self.precipitation = precipitation;
        self.wind_speed = wind_speed;
        self
    }

    /// Build a marker from a feature; `None` when the feature has no usable point
    pub fn from_feature(feature: Feature) -> Option<Self> {
        let position = feature.geometry.as_ref().and_then(Geometry::position)?;

        let coordinate = match Coordinate::from_geojson_position(&position) {
            Ok(c) => c,
            Err(e) => {
                warn!("Skipping station feature {:?}: {}", feature.id, e);
                return None;
            }
        };

        let properties = feature.properties.unwrap_or_default();
        let station_id = feature
            .id
            .map(|id| id.to_string())
            .filter(|id| !id.is_empty());
        let title = properties
            .station_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_STATION_TITLE.to_string());

        Some(
            Self::new(station_id, coordinate, title).with_readings(
                properties.temperature,
                properties.precipitation,
                properties.wind_speed,
            ),
        )
    }

    /// Static lines shown in the details panel before the forecast arrives
    pub fn info_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Stations-ID: {}",
            self.station_id.as_deref().unwrap_or(NOT_AVAILABLE)
        )];

        if let Some(t) = self.temperature {
            lines.push(format!("Temperatur: {}°C", t));
        }
        if let Some(p) = self.precipitation {
            lines.push(format!("Niederschlag: {} mm", p));
        }
        if let Some(w) = self.wind_speed {
            lines.push(format!("Windgeschwindigkeit: {} km/h", w));
        }

        lines
    }
}

/// Convert a whole collection, dropping malformed features and those without a valid point
pub fn markers_from_collection(collection: FeatureCollection) -> Vec<StationMarker> {
    collection
        .features
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<Feature>(raw) {
            Ok(feature) => StationMarker::from_feature(feature),
            Err(e) => {
                warn!("Skipping malformed station feature: {}", e);
                None
            }
        })
        .collect()
}

/// Visual size class of a marker cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClusterSize {
    Small,
    Medium,
    Large,
}

impl ClusterSize {
    pub fn for_count(count: usize) -> Self {
        if count < 10 {
            ClusterSize::Small
        } else if count < 100 {
            ClusterSize::Medium
        } else {
            ClusterSize::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterSize::Small => "small",
            ClusterSize::Medium => "medium",
            ClusterSize::Large => "large",
        }
    }
}
