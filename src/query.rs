//! Radius queries against the spatial index.
//!
//! A query hashes its center at the index precision, takes the candidates
//! from that single bucket and keeps the ones whose ellipsoidal distance is
//! within the radius. Results keep bucket order; nothing is ranked.

use crate::compute::distance::distance_km;
use crate::compute::validation::{validate_coordinates, validate_radius};
use crate::error::{Result, StoreError};
use crate::index::SpatialIndex;
use crate::types::StoreRecord;
use geo::Point;

/// A circular search around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl RadiusQuery {
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_km,
        }
    }

    pub fn center(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Run the query.
    ///
    /// Fails with [`StoreError::NotFound`] when the center's bucket holds no
    /// stores. A bucket whose stores all lie outside the radius yields an
    /// empty list instead. Candidates whose distance does not converge
    /// within `max_iterations` are skipped.
    pub fn execute(&self, index: &SpatialIndex, max_iterations: usize) -> Result<Vec<StoreRecord>> {
        validate_coordinates(self.latitude, self.longitude)?;
        validate_radius(self.radius_km)?;

        log::debug!(
            "getting stores within {} km of lat: {}, long: {}",
            self.radius_km,
            self.latitude,
            self.longitude
        );

        let candidates = index.candidates(self.latitude, self.longitude)?;
        let candidate_count = candidates.len();
        let center = self.center();

        let stores: Vec<StoreRecord> = candidates
            .into_iter()
            .filter(|store| match distance_km(&center, &store.point(), max_iterations) {
                Ok(d) => d <= self.radius_km,
                Err(e) => {
                    log::warn!("skipping store {} in radius query: {}", store.id, e);
                    false
                }
            })
            .collect();

        log::debug!(
            "returning {} of {} candidate stores",
            stores.len(),
            candidate_count
        );
        Ok(stores)
    }
}

/// Convenience wrapper around [`RadiusQuery::execute`].
pub fn query_radius(
    index: &SpatialIndex,
    lat: f64,
    lon: f64,
    radius_km: f64,
    max_iterations: usize,
) -> Result<Vec<StoreRecord>> {
    RadiusQuery::new(lat, lon, radius_km).execute(index, max_iterations)
}

/// True when the error only means the query's bucket was empty.
pub fn is_bucket_miss(err: &StoreError) -> bool {
    matches!(err, StoreError::NotFound(_))
}
