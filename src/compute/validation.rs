//! Validation for geographic coordinates and query parameters.

use crate::error::{Result, StoreError};

/// Validates a latitude/longitude pair in WGS84 degrees.
///
/// Latitude: [-90.0, 90.0], Longitude: [-180.0, 180.0]
///
/// # Examples
///
/// ```
/// use store_locator::compute::validation::validate_coordinates;
///
/// // Hong Kong
/// assert!(validate_coordinates(22.3407, 114.2017).is_ok());
///
/// // Invalid latitude
/// assert!(validate_coordinates(95.0, 114.2017).is_err());
///
/// // Invalid longitude
/// assert!(validate_coordinates(22.3407, 200.0).is_err());
/// ```
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() {
        return Err(StoreError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !lon.is_finite() {
        return Err(StoreError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            lon
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(StoreError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lon) {
        return Err(StoreError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lon
        )));
    }

    Ok(())
}

/// Validates a search radius in kilometers.
pub fn validate_radius(radius_km: f64) -> Result<()> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(StoreError::InvalidInput(format!(
            "Radius must be finite and non-negative, got: {}",
            radius_km
        )));
    }

    Ok(())
}
