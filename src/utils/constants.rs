use std::time::Duration;

/// Geocoding request parameters
pub const MIN_QUERY_LENGTH: usize = 3;
pub const SUGGESTION_LIMIT: u32 = 5;
pub const SEARCH_LIMIT: u32 = 1;

/// API paths
pub const FORECAST_PATH: &str = "climate/v1/mosmix/forecast";
pub const BOUNDS_PATH: &str = "climate/v1/mosmix/bounds";
pub const SEARCH_PATH: &str = "search";

/// Timing
pub const VIEWPORT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
pub const ZOOM_GUARD_FALLBACK: Duration = Duration::from_millis(500);
pub const SEARCH_MARKER_LIFETIME: Duration = Duration::from_secs(8);
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Map geometry
pub const SELECTION_EPSILON_DEG: f64 = 1e-4;
pub const BOUNDS_DECIMALS: usize = 6;
pub const MARKER_ZOOM: u8 = 15;
pub const SEARCH_ZOOM: u8 = 12;

/// Viewport width (px) from which the details panel slides in horizontally
pub const WIDE_VIEWPORT_MIN_WIDTH: u32 = 768;
pub const DISMISS_THRESHOLD_PERCENT: f64 = 50.0;

/// Forecast table
pub const FORECAST_DISPLAY_ROWS: usize = 8;
pub const SUMMARY_WINDOW: usize = 24;
pub const KELVIN_OFFSET: f64 = 273.15;

/// Display labels
pub const NOT_AVAILABLE: &str = "N/V";
pub const NO_SUNSHINE: &str = "Keine";
pub const DEFAULT_STATION_TITLE: &str = "Wetterstation";
pub const MSG_NO_FORECAST_DATA: &str = "Keine Vorhersagedaten verfügbar";
pub const MSG_FORECAST_LOADING: &str = "Vorhersagedaten werden geladen...";
pub const MSG_FORECAST_FAILED: &str = "Vorhersagedaten konnten nicht geladen werden.";
pub const MSG_NO_STATION_ID: &str = "Keine Vorhersagedaten für diese Station verfügbar.";

pub const DEFAULT_USER_AGENT: &str = "WeatherMapApplication/1.0";
pub const ENV_PREFIX: &str = "MOSMIX_MAP";
