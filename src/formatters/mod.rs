pub mod forecast_view;
pub mod text;
pub mod units;

pub use forecast_view::{
    aggregate, format_forecast, format_series, Aggregate, DateGroup, DisplayZone, ForecastRow,
    ForecastSummary, ForecastView,
};
pub use units::{
    format_sunshine, kelvin_to_celsius, pascal_to_hectopascal, wind_arrow, wind_direction_label,
};
