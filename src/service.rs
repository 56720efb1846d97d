//! `StoreLocator`, the service object handed to the transport layer.
//!
//! The locator owns a shared [`SpatialIndex`], the service [`Config`] and the
//! [`RecordSource`] used for ingestion. Cloning it is cheap and every clone
//! works against the same index.

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::geocode::{DEFAULT_COUNTRY_CODE, Geocoder};
use crate::index::SpatialIndex;
use crate::ingest::{self, FileSource, IngestionHandle, RecordSource};
use crate::query::RadiusQuery;
use crate::types::{IndexStats, StoreRecord};
use std::sync::Arc;

/// Store locator service.
///
/// # Examples
///
/// ```rust
/// use store_locator::{Config, StoreLocator, StoreRecord};
///
/// let locator = StoreLocator::new(Config::default())?;
/// locator.insert(StoreRecord::new(6, "Exchange Square", "Hong Kong", "CN", 22.2839, 114.1582))?;
///
/// let nearby = locator.query_radius(22.28, 114.16, 1.0)?;
/// assert_eq!(nearby[0].id, 6);
/// # Ok::<(), store_locator::StoreError>(())
/// ```
#[derive(Clone)]
pub struct StoreLocator {
    index: Arc<SpatialIndex>,
    config: Config,
    source: Arc<dyn RecordSource>,
}

impl StoreLocator {
    /// Create a locator reading ingestion sources from `config.ingest.data_dir`.
    pub fn new(config: Config) -> Result<Self> {
        let source = Arc::new(FileSource::new(config.ingest.data_dir.clone()));
        Self::with_source(config, source)
    }

    /// Create a locator ingesting from an explicit record source.
    pub fn with_source(config: Config, source: Arc<dyn RecordSource>) -> Result<Self> {
        config.validate().map_err(StoreError::InvalidInput)?;

        Ok(Self {
            index: Arc::new(SpatialIndex::new(config.precision)),
            config,
            source,
        })
    }

    pub fn insert(&self, record: StoreRecord) -> Result<()> {
        self.index.insert(record)
    }

    pub fn get(&self, id: u32) -> Result<StoreRecord> {
        self.index.get(id)
    }

    /// Stores in the bucket of `(lat, lon)` within `radius_km`.
    pub fn query_radius(&self, lat: f64, lon: f64, radius_km: f64) -> Result<Vec<StoreRecord>> {
        RadiusQuery::new(lat, lon, radius_km)
            .execute(&self.index, self.config.max_distance_iterations)
    }

    /// Resolve a postal code through `geocoder` and search around it.
    ///
    /// An empty `country_code` means the United States. Geocoder failures are
    /// returned unchanged.
    pub async fn query_postal_code<G: Geocoder>(
        &self,
        geocoder: &G,
        postal_code: &str,
        country_code: &str,
        radius_km: f64,
    ) -> Result<Vec<StoreRecord>> {
        let country_code = if country_code.is_empty() {
            DEFAULT_COUNTRY_CODE
        } else {
            country_code
        };

        let point = geocoder.geocode(postal_code, country_code).await?;
        log::debug!(
            "postal code {} ({}) resolved to lat: {}, long: {}",
            postal_code,
            country_code,
            point.y(),
            point.x()
        );

        self.query_radius(point.y(), point.x(), radius_km)
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    /// Begin ingesting `source_name` in the background.
    ///
    /// The returned handle may be dropped; completion is visible through
    /// [`IndexStats::ready`]. Must be called from within a tokio runtime.
    pub fn start_ingestion(&self, source_name: &str) -> IngestionHandle {
        ingest::start_ingestion(
            Arc::clone(&self.index),
            Arc::clone(&self.source),
            source_name,
            &self.config.ingest,
        )
    }

    /// Clear the index. Intended for test isolation.
    pub fn reset(&self) {
        self.index.reset();
    }

    pub fn index(&self) -> &Arc<SpatialIndex> {
        &self.index
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
