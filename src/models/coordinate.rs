use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{MapError, Result};
use crate::utils::coordinates::{round_degrees, same_position};

/// A WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Coordinate {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(MapError::InvalidCoordinate(format!(
                "Non-finite coordinate ({}, {})",
                latitude, longitude
            )));
        }

        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// GeoJSON positions are `[longitude, latitude, ...]`
    pub fn from_geojson_position(position: &[f64]) -> Result<Self> {
        match position {
            [lon, lat, ..] => Self::new(*lat, *lon),
            _ => Err(MapError::InvalidFormat(format!(
                "GeoJSON position needs two values, got {}",
                position.len()
            ))),
        }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Equality within the selection epsilon used to re-identify stations
    pub fn is_near(&self, other: &Coordinate) -> bool {
        same_position(self.as_tuple(), other.as_tuple())
    }
}

/// The rectangular viewport of the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        let values = [west, south, east, north];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MapError::InvalidCoordinate(format!(
                "Non-finite bounds {:?}",
                values
            )));
        }
        if south > north {
            return Err(MapError::InvalidCoordinate(format!(
                "South edge {} lies north of north edge {}",
                south, north
            )));
        }

        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    /// Query parameters for the bounds endpoint, rounded to 6 decimals
    pub fn query_params(&self) -> [(&'static str, String); 4] {
        [
            ("xmin", round_degrees(self.west)),
            ("ymin", round_degrees(self.south)),
            ("xmax", round_degrees(self.east)),
            ("ymax", round_degrees(self.north)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(54.7833, 9.4333).is_ok());
        assert!(Coordinate::new(91.0, 9.0).is_err());
        assert!(Coordinate::new(54.0, -181.0).is_err());
        assert!(Coordinate::new(f64::NAN, 9.0).is_err());
    }

    #[test]
    fn test_from_geojson_position() {
        let c = Coordinate::from_geojson_position(&[9.4333, 54.7833]).unwrap();
        assert_eq!(c.latitude, 54.7833);
        assert_eq!(c.longitude, 9.4333);

        assert!(Coordinate::from_geojson_position(&[9.4333]).is_err());
    }

    #[test]
    fn test_is_near() {
        let a = Coordinate::new(54.7833, 9.4333).unwrap();
        let b = Coordinate::new(54.78335, 9.43325).unwrap();
        let c = Coordinate::new(54.7835, 9.4333).unwrap();
        assert!(a.is_near(&b));
        assert!(!a.is_near(&c));
    }

    #[test]
    fn test_bounds_query_params() {
        let bounds = Bounds::new(8.1234567, 54.0, 10.5, 55.00000049).unwrap();
        let params = bounds.query_params();
        assert_eq!(params[0], ("xmin", "8.123457".to_string()));
        assert_eq!(params[1], ("ymin", "54.000000".to_string()));
        assert_eq!(params[2], ("xmax", "10.500000".to_string()));
        assert_eq!(params[3], ("ymax", "55.000000".to_string()));
    }

    #[test]
    fn test_bounds_rejects_inverted_latitudes() {
        assert!(Bounds::new(8.0, 55.0, 10.0, 54.0).is_err());
    }
}
