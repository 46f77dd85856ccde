use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::models::lenient;

/// Forecast payload exactly as delivered by the MOSMIX endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    #[serde(rename = "timeSteps", default)]
    pub time_steps: Vec<String>,
    #[serde(default)]
    pub station: Option<StationSeries>,
}

/// MOSMIX element arrays, one value per time step; `null` marks a gap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationSeries {
    /// Temperature 2 m above surface (K)
    #[serde(rename = "TTT", default, deserialize_with = "lenient::number_series")]
    pub temperature: Vec<Option<f64>>,
    /// Wind speed (m/s)
    #[serde(rename = "FF", default, deserialize_with = "lenient::number_series")]
    pub wind_speed: Vec<Option<f64>>,
    /// Surface pressure reduced (Pa)
    #[serde(rename = "PPPP", default, deserialize_with = "lenient::number_series")]
    pub pressure: Vec<Option<f64>>,
    /// Total precipitation during the last hour (mm)
    #[serde(rename = "RR1c", default, deserialize_with = "lenient::number_series")]
    pub precipitation: Vec<Option<f64>>,
    /// Effective cloud cover (%)
    #[serde(rename = "Neff", default, deserialize_with = "lenient::number_series")]
    pub cloud_cover: Vec<Option<f64>>,
    /// Wind direction (degrees, "from")
    #[serde(rename = "DD", default, deserialize_with = "lenient::number_series")]
    pub wind_direction: Vec<Option<f64>>,
    /// Sunshine duration during the last hour
    #[serde(rename = "SunD1", default, deserialize_with = "lenient::number_series")]
    pub sunshine: Vec<Option<f64>>,
}

/// One time step with every element looked up by the same ordinal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
    pub precipitation: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub wind_direction: Option<f64>,
    pub sunshine: Option<f64>,
}

/// Forecast with parsed timestamps; element arrays may be shorter than `timestamps`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastSeries {
    pub timestamps: Vec<DateTime<Utc>>,
    pub elements: StationSeries,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn sample(&self, index: usize) -> Option<ForecastSample> {
        let timestamp = *self.timestamps.get(index)?;
        let e = &self.elements;

        Some(ForecastSample {
            timestamp,
            temperature: value_at(&e.temperature, index),
            wind_speed: value_at(&e.wind_speed, index),
            pressure: value_at(&e.pressure, index),
            precipitation: value_at(&e.precipitation, index),
            cloud_cover: value_at(&e.cloud_cover, index),
            wind_direction: value_at(&e.wind_direction, index),
            sunshine: value_at(&e.sunshine, index),
        })
    }
}

impl TryFrom<&ForecastPayload> for ForecastSeries {
    type Error = MapError;

    fn try_from(payload: &ForecastPayload) -> Result<Self> {
        let timestamps = payload
            .time_steps
            .iter()
            .map(|step| parse_time_step(step))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            timestamps,
            elements: payload.station.clone().unwrap_or_default(),
        })
    }
}

/// Missing, `null` and non-finite entries are all "not available"
fn value_at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values
        .get(index)
        .copied()
        .flatten()
        .filter(|v| v.is_finite())
}

/// Parse an ISO time step; values without an offset are taken as UTC
pub fn parse_time_step(step: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(step) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(step, "%Y-%m-%dT%H:%M:%S%.f")?;
    Ok(naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_payload_deserialization_with_gaps() {
        let payload: ForecastPayload = serde_json::from_value(json!({
            "timeSteps": ["2025-04-17T12:00:00.000Z", "2025-04-17T13:00:00.000Z"],
            "station": {
                "TTT": [285.15, null],
                "FF": [3.2],
                "DD": [270.0, 280.0]
            }
        }))
        .unwrap();

        let series = ForecastSeries::try_from(&payload).unwrap();
        assert_eq!(series.len(), 2);

        let first = series.sample(0).unwrap();
        assert_eq!(
            first.timestamp,
            Utc.with_ymd_and_hms(2025, 4, 17, 12, 0, 0).unwrap()
        );
        assert_eq!(first.temperature, Some(285.15));
        assert_eq!(first.wind_speed, Some(3.2));
        assert_eq!(first.pressure, None);

        let second = series.sample(1).unwrap();
        assert_eq!(second.temperature, None);
        assert_eq!(second.wind_speed, None);
        assert_eq!(second.wind_direction, Some(280.0));

        assert!(series.sample(2).is_none());
    }

    #[test]
    fn test_missing_station_block() {
        let payload: ForecastPayload = serde_json::from_value(json!({
            "timeSteps": ["2025-04-17T12:00:00Z"]
        }))
        .unwrap();

        let series = ForecastSeries::try_from(&payload).unwrap();
        assert_eq!(series.sample(0).unwrap().temperature, None);
    }

    #[test]
    fn test_parse_time_step_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 4, 17, 10, 0, 0).unwrap();
        assert_eq!(parse_time_step("2025-04-17T10:00:00Z").unwrap(), expected);
        assert_eq!(parse_time_step("2025-04-17T12:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_time_step("2025-04-17T10:00:00").unwrap(), expected);
        assert!(parse_time_step("yesterday").is_err());
    }
}
