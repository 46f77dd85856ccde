use crate::error::{MapError, Result};
use crate::utils::constants::{BOUNDS_DECIMALS, SELECTION_EPSILON_DEG};

/// Parse a decimal degree value as delivered by geocoders (often a JSON string)
///
/// # Examples
/// ```
/// use mosmix_map::utils::coordinates::parse_degrees;
///
/// let lat = parse_degrees(" 54.7833 ").unwrap();
/// assert!((lat - 54.7833).abs() < 1e-9);
/// ```
pub fn parse_degrees(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    let parsed = trimmed.parse::<f64>().map_err(|_| {
        MapError::InvalidCoordinate(format!("Invalid coordinate value: '{}'", value))
    })?;

    if !parsed.is_finite() {
        return Err(MapError::InvalidCoordinate(format!(
            "Coordinate value is not finite: '{}'",
            value
        )));
    }

    Ok(parsed)
}

/// Render a degree value with the fixed precision used for bounds queries
pub fn round_degrees(value: f64) -> String {
    format!("{:.*}", BOUNDS_DECIMALS, value)
}

/// Whether two positions denote the same station across marker refreshes
pub fn same_position(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 - b.0).abs() < SELECTION_EPSILON_DEG && (a.1 - b.1).abs() < SELECTION_EPSILON_DEG
}

/// Format the cursor/centre readout shown in the map footer
pub fn format_readout(position: Option<(f64, f64)>) -> String {
    match position {
        Some((lat, lng)) => format!("Lat: {:.6} | Lng: {:.6}", lat, lng),
        None => "Lat: -- | Lng: --".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_degrees() {
        assert!((parse_degrees("54.7833").unwrap() - 54.7833).abs() < 1e-9);
        assert!((parse_degrees(" -0.1278 ").unwrap() - -0.1278).abs() < 1e-9);
        assert!(parse_degrees("north").is_err());
        assert!(parse_degrees("NaN").is_err());
        assert!(parse_degrees("inf").is_err());
    }

    #[test]
    fn test_round_degrees() {
        assert_eq!(round_degrees(9.123456789), "9.123457");
        assert_eq!(round_degrees(-0.5), "-0.500000");
        assert_eq!(round_degrees(54.0), "54.000000");
    }

    #[test]
    fn test_same_position() {
        assert!(same_position((54.78, 9.43), (54.78005, 9.43005)));
        assert!(!same_position((54.78, 9.43), (54.7802, 9.43)));
        assert!(!same_position((54.78, 9.43), (54.78, 9.4302)));
    }

    #[test]
    fn test_format_readout() {
        assert_eq!(format_readout(None), "Lat: -- | Lng: --");
        assert_eq!(
            format_readout(Some((54.5, 10.0))),
            "Lat: 54.500000 | Lng: 10.000000"
        );
    }
}
