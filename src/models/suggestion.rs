use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::models::Coordinate;
use crate::utils::coordinates::parse_degrees;

/// Degree value as returned by the geocoder: Nominatim sends strings, others numbers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DegreeValue {
    Text(String),
    Number(f64),
}

impl DegreeValue {
    pub fn to_degrees(&self) -> Result<f64> {
        match self {
            DegreeValue::Text(text) => parse_degrees(text),
            DegreeValue::Number(value) => Ok(*value),
        }
    }
}

/// One entry of the geocoder's JSON array
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlace {
    pub display_name: String,
    pub lat: DegreeValue,
    pub lon: DegreeValue,
    #[serde(default)]
    pub geojson: Option<serde_json::Value>,
    #[serde(default)]
    pub osm_type: Option<String>,
    #[serde(default)]
    pub osm_id: Option<u64>,
}

/// Origin of a geocoding result in the upstream database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_type: String,
    pub source_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    pub display_name: String,
    pub coordinate: Coordinate,
    pub geometry: Option<serde_json::Value>,
    pub source: Option<SourceRef>,
}

impl TryFrom<RawPlace> for SuggestionRecord {
    type Error = MapError;

    fn try_from(raw: RawPlace) -> Result<Self> {
        let coordinate = Coordinate::new(raw.lat.to_degrees()?, raw.lon.to_degrees()?)?;

        // Only a complete type/id pair identifies the source object
        let source = match (raw.osm_type, raw.osm_id) {
            (Some(source_type), Some(source_id)) => Some(SourceRef {
                source_type,
                source_id,
            }),
            _ => None,
        };

        Ok(Self {
            display_name: raw.display_name,
            coordinate,
            geometry: raw.geojson,
            source,
        })
    }
}
