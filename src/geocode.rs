//! Postal-code geocoding boundary.
//!
//! Resolving a postal code to coordinates is an external service call; the
//! index only needs the [`Geocoder`] capability. [`StaticGeocoder`] is a
//! lookup-table implementation for tests and fixed deployments.

use crate::error::{Result, StoreError};
use geo::Point;
use rustc_hash::FxHashMap;
use std::future::Future;

/// Country assumed when a caller does not supply one.
pub const DEFAULT_COUNTRY_CODE: &str = "US";

/// Resolves a postal code within a country to a point (x = longitude, y = latitude).
pub trait Geocoder: Send + Sync {
    /// Fails with [`StoreError::Geocode`] when the code cannot be resolved.
    fn geocode(
        &self,
        postal_code: &str,
        country_code: &str,
    ) -> impl Future<Output = Result<Point<f64>>> + Send;
}

/// Geocoder backed by a fixed table of postal codes.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    entries: FxHashMap<(String, String), Point<f64>>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the location of `postal_code` in `country_code`.
    pub fn with_entry(
        mut self,
        country_code: &str,
        postal_code: &str,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        self.entries.insert(
            (country_code.to_ascii_uppercase(), postal_code.trim().to_string()),
            Point::new(longitude, latitude),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Geocoder for StaticGeocoder {
    async fn geocode(&self, postal_code: &str, country_code: &str) -> Result<Point<f64>> {
        let key = (
            country_code.to_ascii_uppercase(),
            postal_code.trim().to_string(),
        );
        self.entries.get(&key).copied().ok_or_else(|| {
            StoreError::Geocode(format!(
                "no location for postal code {postal_code} in {country_code}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_geocoder() {
        let geocoder = StaticGeocoder::new().with_entry("us", "94105", 37.7898, -122.3942);
        assert_eq!(geocoder.len(), 1);

        let point = geocoder.geocode(" 94105 ", "US").await.unwrap();
        assert_eq!(point.y(), 37.7898);
        assert_eq!(point.x(), -122.3942);
    }

    #[tokio::test]
    async fn test_static_geocoder_unknown_code() {
        let geocoder = StaticGeocoder::new();
        assert!(matches!(
            geocoder.geocode("00000", "US").await,
            Err(StoreError::Geocode(_))
        ));
    }
}
