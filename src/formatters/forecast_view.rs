//! Display structures for the forecast section of the details panel.
//!
//! The presentation layer renders a [`ForecastView`]: a 24 hour summary and a
//! table of the first eight time steps grouped by calendar date. Every cell is
//! already a display string; gaps in the series read "N/V".

use chrono::{FixedOffset, Local, NaiveDate, TimeZone};
use serde::Serialize;
use std::fmt::Display;
use tracing::warn;

use crate::formatters::units::{
    format_celsius, format_cloud_cover, format_hectopascal, format_precipitation,
    format_sunshine, format_wind_speed, kelvin_to_celsius, round_to, wind_arrow,
    wind_direction_label,
};
use crate::models::{ForecastPayload, ForecastSample, ForecastSeries};
use crate::utils::constants::{FORECAST_DISPLAY_ROWS, NOT_AVAILABLE, SUMMARY_WINDOW};

/// Reduction over a window where gaps are excluded rather than counted as zero
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregate {
    pub count: usize,
    /// 0 when `count` is 0
    pub mean: f64,
    /// 0 when `count` is 0
    pub sum: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

pub fn aggregate<I>(values: I) -> Aggregate
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut max: Option<f64> = None;
    let mut min: Option<f64> = None;

    for value in values.into_iter().flatten().filter(|v| v.is_finite()) {
        count += 1;
        sum += value;
        max = Some(max.map_or(value, |m| m.max(value)));
        min = Some(min.map_or(value, |m| m.min(value)));
    }

    let mean = if count == 0 { 0.0 } else { sum / count as f64 };

    Aggregate {
        count,
        mean,
        sum,
        max,
        min,
    }
}

/// Next-24-hours summary; temperatures stay in Kelvin until rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub temperature: Aggregate,
    pub precipitation: Aggregate,
}

impl ForecastSummary {
    pub fn from_series(series: &ForecastSeries) -> Self {
        let window: Vec<ForecastSample> = (0..series.len().min(SUMMARY_WINDOW))
            .filter_map(|i| series.sample(i))
            .collect();

        Self {
            temperature: aggregate(window.iter().map(|s| s.temperature)),
            precipitation: aggregate(window.iter().map(|s| s.precipitation)),
        }
    }

    pub fn mean_temperature_celsius(&self) -> Option<f64> {
        (self.temperature.count > 0).then(|| kelvin_to_celsius(self.temperature.mean))
    }

    pub fn lines(&self) -> Vec<String> {
        let mean = if self.temperature.count > 0 {
            format_celsius(self.temperature.mean)
        } else {
            NOT_AVAILABLE.to_string()
        };
        let max = self
            .temperature
            .max
            .map(format_celsius)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let min = self
            .temperature
            .min
            .map(format_celsius)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        vec![
            format!("Ø Temperatur nächste 24h: {}", mean),
            format!("Maximum: {} / Minimum: {}", max, min),
            format!(
                "Niederschlag nächste 24h: {:.1} mm",
                round_to(self.precipitation.sum, 1)
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub time: String,
    pub temperature: String,
    pub wind_speed: String,
    pub direction: String,
    pub direction_arrow: Option<char>,
    pub pressure: String,
    pub precipitation: String,
    pub cloud_cover: String,
    pub sunshine: String,
}

impl ForecastRow {
    pub fn from_sample<Tz>(sample: &ForecastSample, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let local = sample.timestamp.with_timezone(tz);

        Self {
            time: local.format("%H:%M").to_string(),
            temperature: or_not_available(sample.temperature.map(format_celsius)),
            wind_speed: or_not_available(sample.wind_speed.map(format_wind_speed)),
            direction: or_not_available(
                sample
                    .wind_direction
                    .and_then(wind_direction_label)
                    .map(str::to_string),
            ),
            direction_arrow: sample.wind_direction.and_then(wind_arrow),
            pressure: or_not_available(sample.pressure.map(format_hectopascal)),
            precipitation: or_not_available(sample.precipitation.map(format_precipitation)),
            cloud_cover: or_not_available(sample.cloud_cover.map(format_cloud_cover)),
            sunshine: format_sunshine(sample.sunshine),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    /// German short date, e.g. `17.4.2025`
    pub label: String,
    pub rows: Vec<ForecastRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastView {
    /// No time steps, or a payload that could not be interpreted
    Unavailable,
    Table {
        summary: ForecastSummary,
        groups: Vec<DateGroup>,
    },
}

impl ForecastView {
    pub fn row_count(&self) -> usize {
        match self {
            ForecastView::Unavailable => 0,
            ForecastView::Table { groups, .. } => groups.iter().map(|g| g.rows.len()).sum(),
        }
    }
}

/// Build the panel view for a raw payload, grouping dates in `tz`
pub fn format_forecast<Tz>(payload: &ForecastPayload, tz: &Tz) -> ForecastView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let series = match ForecastSeries::try_from(payload) {
        Ok(series) => series,
        Err(e) => {
            warn!("Unreadable forecast time steps: {}", e);
            return ForecastView::Unavailable;
        }
    };

    format_series(&series, tz)
}

pub fn format_series<Tz>(series: &ForecastSeries, tz: &Tz) -> ForecastView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if series.is_empty() {
        return ForecastView::Unavailable;
    }

    let summary = ForecastSummary::from_series(series);

    let mut shown: Vec<ForecastSample> = (0..series.len().min(FORECAST_DISPLAY_ROWS))
        .filter_map(|i| series.sample(i))
        .collect();
    shown.sort_by_key(|s| s.timestamp);

    let mut groups: Vec<DateGroup> = Vec::new();
    for sample in &shown {
        let local = sample.timestamp.with_timezone(tz);
        let date = local.date_naive();
        let row = ForecastRow::from_sample(sample, tz);

        match groups.last_mut() {
            Some(group) if group.date == date => group.rows.push(row),
            _ => groups.push(DateGroup {
                date,
                label: local.format("%-d.%-m.%Y").to_string(),
                rows: vec![row],
            }),
        }
    }

    ForecastView::Table { summary, groups }
}

/// Time zone the forecast table groups its dates in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl DisplayZone {
    pub fn format(&self, payload: &ForecastPayload) -> ForecastView {
        match self {
            DisplayZone::Local => format_forecast(payload, &Local),
            DisplayZone::Fixed(offset) => format_forecast(payload, offset),
        }
    }
}

fn or_not_available(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn hourly_payload(start: &str, hours: usize) -> ForecastPayload {
        let start = chrono::DateTime::parse_from_rfc3339(start).unwrap();
        let steps: Vec<String> = (0..hours)
            .map(|h| (start + Duration::hours(h as i64)).to_rfc3339())
            .collect();
        let temps: Vec<f64> = (0..hours).map(|h| 273.15 + h as f64).collect();
        let precip = vec![0.5; hours];
        let wind = vec![4.0; hours];
        let pressure = vec![101300.0; hours];
        let clouds = vec![75.0; hours];
        let direction = vec![270.0; hours];
        let sunshine = vec![0.0; hours];

        serde_json::from_value(json!({
            "timeSteps": steps,
            "station": {
                "TTT": temps,
                "FF": wind,
                "PPPP": pressure,
                "RR1c": precip,
                "Neff": clouds,
                "DD": direction,
                "SunD1": sunshine
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_aggregate_excludes_gaps() {
        let agg = aggregate(vec![Some(1.0), None, Some(3.0), Some(f64::NAN)]);
        assert_eq!(agg.count, 2);
        assert_eq!(agg.sum, 4.0);
        assert_eq!(agg.mean, 2.0);
        assert_eq!(agg.max, Some(3.0));
        assert_eq!(agg.min, Some(1.0));
    }

    #[test]
    fn test_aggregate_empty() {
        let agg = aggregate(Vec::<Option<f64>>::new());
        assert_eq!(agg.count, 0);
        assert_eq!(agg.sum, 0.0);
        assert_eq!(agg.mean, 0.0);
        assert_eq!(agg.max, None);
        assert_eq!(agg.min, None);
    }

    #[test]
    fn test_summary_uses_first_24_entries_only() {
        let payload = hourly_payload("2025-04-17T00:00:00Z", 48);
        let series = ForecastSeries::try_from(&payload).unwrap();
        let summary = ForecastSummary::from_series(&series);

        assert_eq!(summary.temperature.count, 24);
        // 0..=23 °C
        assert_eq!(summary.temperature.max, Some(273.15 + 23.0));
        assert_eq!(summary.temperature.min, Some(273.15));
        assert_eq!(summary.precipitation.sum, 12.0);
        assert!((summary.mean_temperature_celsius().unwrap() - 11.5).abs() < 1e-9);
    }

    #[test]
    fn test_table_is_capped_at_eight_rows() {
        let payload = hourly_payload("2025-04-17T00:00:00Z", 24);
        let view = format_forecast(&payload, &Utc);
        assert_eq!(view.row_count(), 8);

        let ForecastView::Table { summary, groups } = view else {
            panic!("expected a table");
        };
        assert_eq!(summary.temperature.count, 24);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "17.4.2025");

        let first = &groups[0].rows[0];
        assert_eq!(first.time, "00:00");
        assert_eq!(first.temperature, "0.0 °C");
        assert_eq!(first.wind_speed, "4.0 m/s");
        assert_eq!(first.direction, "W");
        assert_eq!(first.direction_arrow, Some('→'));
        assert_eq!(first.pressure, "1013 hPa");
        assert_eq!(first.precipitation, "0.5 mm");
        assert_eq!(first.cloud_cover, "75%");
        assert_eq!(first.sunshine, "Keine");
    }

    #[test]
    fn test_grouping_follows_display_timezone() {
        let payload = hourly_payload("2025-04-17T20:00:00Z", 8);

        let utc_view = format_forecast(&payload, &Utc);
        let ForecastView::Table { groups, .. } = utc_view else {
            panic!("expected a table");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rows.len(), 4);
        assert_eq!(groups[1].label, "18.4.2025");

        let cest = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_view = format_forecast(&payload, &cest);
        let ForecastView::Table { groups, .. } = local_view else {
            panic!("expected a table");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rows.len(), 2);
        assert_eq!(groups[0].rows[0].time, "22:00");
        assert_eq!(groups[1].rows[0].time, "00:00");
    }

    #[test]
    fn test_unordered_steps_are_sorted_within_groups() {
        let payload: ForecastPayload = serde_json::from_value(json!({
            "timeSteps": ["2025-04-17T13:00:00Z", "2025-04-17T12:00:00Z"],
            "station": {"TTT": [280.15, 279.15]}
        }))
        .unwrap();

        let ForecastView::Table { groups, .. } = format_forecast(&payload, &Utc) else {
            panic!("expected a table");
        };
        assert_eq!(groups[0].rows[0].time, "12:00");
        assert_eq!(groups[0].rows[0].temperature, "6.0 °C");
        assert_eq!(groups[0].rows[1].time, "13:00");
    }

    #[test]
    fn test_gaps_render_not_available() {
        let payload: ForecastPayload = serde_json::from_value(json!({
            "timeSteps": ["2025-04-17T12:00:00Z"],
            "station": {"TTT": [null], "FF": [0.0]}
        }))
        .unwrap();

        let ForecastView::Table { summary, groups } = format_forecast(&payload, &Utc) else {
            panic!("expected a table");
        };
        let row = &groups[0].rows[0];
        assert_eq!(row.temperature, "N/V");
        assert_eq!(row.wind_speed, "0.0 m/s");
        assert_eq!(row.direction, "N/V");
        assert_eq!(row.direction_arrow, None);
        assert_eq!(row.pressure, "N/V");

        assert_eq!(
            summary.lines(),
            vec![
                "Ø Temperatur nächste 24h: N/V".to_string(),
                "Maximum: N/V / Minimum: N/V".to_string(),
                "Niederschlag nächste 24h: 0.0 mm".to_string(),
            ]
        );
    }

    #[test]
    fn test_summary_with_malformed_entry_and_rounding_tie() {
        let payload: ForecastPayload = serde_json::from_value(json!({
            "timeSteps": [
                "2025-04-17T12:00:00Z",
                "2025-04-17T13:00:00Z",
                "2025-04-17T14:00:00Z"
            ],
            "station": {
                "TTT": [283.15, "n/a", 284.15],
                "RR1c": [0.25, null, 0.0],
                "PPPP": [101250.0, 101300.0, true]
            }
        }))
        .unwrap();

        let ForecastView::Table { summary, groups } = format_forecast(&payload, &Utc) else {
            panic!("expected a table");
        };
        assert_eq!(groups[0].rows[0].pressure, "1013 hPa");
        assert_eq!(groups[0].rows[1].temperature, "N/V");
        assert_eq!(groups[0].rows[2].pressure, "N/V");

        assert_eq!(
            summary.lines(),
            vec![
                "Ø Temperatur nächste 24h: 10.5 °C".to_string(),
                "Maximum: 11.0 °C / Minimum: 10.0 °C".to_string(),
                "Niederschlag nächste 24h: 0.3 mm".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_or_broken_payload_is_unavailable() {
        assert_eq!(
            format_forecast(&ForecastPayload::default(), &Utc),
            ForecastView::Unavailable
        );

        let broken = ForecastPayload {
            time_steps: vec!["not a time".to_string()],
            station: None,
        };
        assert_eq!(format_forecast(&broken, &Utc), ForecastView::Unavailable);
    }

    #[test]
    fn test_display_zone_fixed_offset() {
        let payload = hourly_payload("2025-04-17T23:00:00Z", 1);
        let zone = DisplayZone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap());

        match zone.format(&payload) {
            ForecastView::Table { groups, .. } => {
                assert_eq!(groups[0].label, "18.4.2025");
                assert_eq!(groups[0].rows[0].time, "01:00");
            }
            ForecastView::Unavailable => panic!("expected a table"),
        }
    }
}
