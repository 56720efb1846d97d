//! In-memory store locator with a bucketed geospatial index and a streaming
//! ingestion pipeline.
//!
//! ```rust
//! use store_locator::{Config, StoreLocator, StoreRecord};
//!
//! let locator = StoreLocator::new(Config::default())?;
//! locator.insert(StoreRecord::new(1, "Plaza Hollywood", "Hong Kong", "CN", 22.3407, 114.2017))?;
//!
//! let nearby = locator.query_radius(22.34, 114.20, 2.0)?;
//! assert_eq!(nearby.len(), 1);
//! # Ok::<(), store_locator::StoreError>(())
//! ```

pub mod compute;
pub mod config;
pub mod error;
pub mod geocode;
pub mod index;
pub mod ingest;
pub mod query;
pub mod service;
pub mod types;

pub use config::{Config, IngestConfig};
pub use error::{Result, StoreError};
pub use geocode::{Geocoder, StaticGeocoder};
pub use index::SpatialIndex;
pub use ingest::{
    FileSource, IngestReport, IngestionHandle, MemorySource, RecordReader, RecordSource,
    StageOutcome, start_ingestion,
};
pub use query::{RadiusQuery, query_radius};
pub use service::StoreLocator;
pub use types::{IndexStats, StoreRecord};

pub use geo::{Point, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Result, StoreError, StoreLocator};

    pub use geo::Point;

    pub use crate::{IndexStats, SpatialIndex, StoreRecord};

    pub use crate::{Config, IngestConfig};

    pub use crate::{FileSource, MemorySource, RecordSource, StageOutcome};

    pub use crate::{Geocoder, StaticGeocoder};
}
