use crate::utils::constants::{KELVIN_OFFSET, NO_SUNSHINE};

/// German 16-point compass, clockwise from north
const COMPASS_LABELS: [&str; 16] = [
    "N", "NNO", "NO", "ONO", "O", "OSO", "SO", "SSO", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Arrows indexed by the bearing they point to, clockwise from north
const ARROWS_BY_BEARING: [char; 8] = ['↑', '↗', '→', '↘', '↓', '↙', '←', '↖'];

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

pub fn pascal_to_hectopascal(pascal: f64) -> f64 {
    pascal / 100.0
}

/// Round half away from zero; `{:.N}` alone would round ties to even
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

pub fn format_celsius(kelvin: f64) -> String {
    format!("{:.1} °C", round_to(kelvin_to_celsius(kelvin), 1))
}

pub fn format_hectopascal(pascal: f64) -> String {
    format!("{:.0} hPa", round_to(pascal_to_hectopascal(pascal), 0))
}

pub fn format_wind_speed(metres_per_second: f64) -> String {
    format!("{:.1} m/s", round_to(metres_per_second, 1))
}

pub fn format_precipitation(millimetres: f64) -> String {
    format!("{} mm", millimetres)
}

pub fn format_cloud_cover(percent: f64) -> String {
    format!("{}%", percent)
}

/// Compass label for a meteorological ("from") wind direction
pub fn wind_direction_label(degrees: f64) -> Option<&'static str> {
    if !degrees.is_finite() {
        return None;
    }
    let index = (degrees / 22.5).round() as i64;
    Some(COMPASS_LABELS[index.rem_euclid(16) as usize])
}

/// Arrow showing where the wind blows to, i.e. opposite the reported direction
pub fn wind_arrow(degrees: f64) -> Option<char> {
    if !degrees.is_finite() {
        return None;
    }
    let towards = (degrees + 180.0).rem_euclid(360.0);
    let index = (towards / 45.0).round() as i64;
    Some(ARROWS_BY_BEARING[index.rem_euclid(8) as usize])
}

/// Sunshine duration label; absent, NaN, zero and negative values read "Keine"
pub fn format_sunshine(minutes: Option<f64>) -> String {
    match minutes {
        Some(m) if m.is_finite() && m > 0.0 => format!("{} Min", (m / 60.0).round() as i64),
        _ => NO_SUNSHINE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelvin_to_celsius() {
        assert_eq!(kelvin_to_celsius(273.15), 0.0);
        assert_eq!(kelvin_to_celsius(373.15), 100.0);
        assert_eq!(format_celsius(285.65), "12.5 °C");
        assert_eq!(format_celsius(268.15), "-5.0 °C");
    }

    #[test]
    fn test_pressure() {
        assert_eq!(pascal_to_hectopascal(101325.0), 1013.25);
        assert_eq!(format_hectopascal(101325.0), "1013 hPa");
        assert_eq!(format_hectopascal(99870.0), "999 hPa");
    }

    #[test]
    fn test_ties_round_up() {
        assert_eq!(format_hectopascal(101250.0), "1013 hPa");
        assert_eq!(format_hectopascal(100850.0), "1009 hPa");
        assert_eq!(format_wind_speed(3.25), "3.3 m/s");
        assert_eq!(format_wind_speed(0.45), "0.5 m/s");
        assert_eq!(round_to(-2.25, 1), -2.3);
        assert_eq!(round_to(12.5, 0), 13.0);
    }

    #[test]
    fn test_wind_direction_label() {
        assert_eq!(wind_direction_label(0.0), Some("N"));
        assert_eq!(wind_direction_label(180.0), Some("S"));
        assert_eq!(wind_direction_label(360.0), wind_direction_label(0.0));
        assert_eq!(wind_direction_label(22.5), Some("NNO"));
        assert_eq!(wind_direction_label(90.0), Some("O"));
        assert_eq!(wind_direction_label(348.0), Some("NNW"));
        assert_eq!(wind_direction_label(355.0), Some("N"));
        assert_eq!(wind_direction_label(f64::NAN), None);
    }

    #[test]
    fn test_wind_arrow() {
        // From north, blowing south
        assert_eq!(wind_arrow(0.0), Some('↓'));
        // From east, blowing west
        assert_eq!(wind_arrow(90.0), Some('←'));
        assert_eq!(wind_arrow(180.0), Some('↑'));
        assert_eq!(wind_arrow(270.0), Some('→'));
        assert_eq!(wind_arrow(225.0), Some('↗'));
        assert_eq!(wind_arrow(360.0), wind_arrow(0.0));
        assert_eq!(wind_arrow(f64::INFINITY), None);
    }

    #[test]
    fn test_format_sunshine() {
        assert_eq!(format_sunshine(Some(0.0)), "Keine");
        assert_eq!(format_sunshine(Some(-5.0)), "Keine");
        assert_eq!(format_sunshine(None), "Keine");
        assert_eq!(format_sunshine(Some(f64::NAN)), "Keine");
        assert_eq!(format_sunshine(Some(3600.0)), "60 Min");
        assert_eq!(format_sunshine(Some(1770.0)), "30 Min");
    }

    #[test]
    fn test_plain_number_labels() {
        assert_eq!(format_wind_speed(3.0), "3.0 m/s");
        assert_eq!(format_precipitation(0.3), "0.3 mm");
        assert_eq!(format_precipitation(1.0), "1 mm");
        assert_eq!(format_cloud_cover(87.0), "87%");
    }
}
