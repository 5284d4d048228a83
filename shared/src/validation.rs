//! Validation utilities for alert definitions

use rust_decimal::Decimal;

// ============================================================================
// Location Validations
// ============================================================================

/// Validate latitude is within -90..=90 degrees
pub fn validate_latitude(latitude: Decimal) -> Result<(), &'static str> {
    if latitude < Decimal::from(-90) || latitude > Decimal::from(90) {
        return Err("Latitude must be between -90 and 90");
    }
    Ok(())
}

/// Validate longitude is within -180..=180 degrees
pub fn validate_longitude(longitude: Decimal) -> Result<(), &'static str> {
    if longitude < Decimal::from(-180) || longitude > Decimal::from(180) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

/// Canonical form of a city name: trimmed and lower-cased.
/// Returns `None` for blank names.
pub fn canonical_city(city: &str) -> Option<String> {
    let trimmed = city.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

// ============================================================================
// Condition Validations
// ============================================================================

/// Validate a threshold or measured value can take part in a comparison
pub fn validate_comparable(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() {
        return Err("Value must be a finite number");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_bounds() {
        assert!(validate_latitude(Decimal::from(90)).is_ok());
        assert!(validate_latitude(Decimal::from(-90)).is_ok());
        assert!(validate_latitude(Decimal::from(91)).is_err());
        assert!(validate_latitude(Decimal::from(-91)).is_err());
    }

    #[test]
    fn test_longitude_bounds() {
        assert!(validate_longitude(Decimal::from(180)).is_ok());
        assert!(validate_longitude(Decimal::from(-181)).is_err());
    }

    #[test]
    fn test_canonical_city() {
        assert_eq!(canonical_city("  Cairo "), Some("cairo".to_string()));
        assert_eq!(canonical_city("   "), None);
        assert_eq!(canonical_city(""), None);
    }

    #[test]
    fn test_validate_comparable() {
        assert!(validate_comparable(12.5).is_ok());
        assert!(validate_comparable(f64::NAN).is_err());
        assert!(validate_comparable(f64::INFINITY).is_err());
    }
}
