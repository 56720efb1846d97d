//! Configuration for the store index and ingestion pipeline.
//!
//! Everything the pipeline needs is carried in an explicit [`Config`] value
//! handed to [`StoreLocator::new`](crate::StoreLocator::new).
use serde::de::Error;
use std::path::PathBuf;

use crate::compute::quadhash::MAX_PRECISION;

/// Service configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Bucket-key length used for both insertion and lookup (1-12)
    #[serde(default = "Config::default_precision")]
    pub precision: usize,

    /// Iteration limit for the ellipsoidal distance solver
    #[serde(default = "Config::default_max_distance_iterations")]
    pub max_distance_iterations: usize,

    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Settings for the streaming ingestion pipeline
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Capacity of the channel between the parse and insert stages
    #[serde(default = "IngestConfig::default_channel_capacity")]
    pub channel_capacity: usize,

    /// Directory that file-backed record sources resolve names against
    #[serde(default = "IngestConfig::default_data_dir")]
    pub data_dir: PathBuf,
}

impl IngestConfig {
    const fn default_channel_capacity() -> usize {
        2
    }

    fn default_data_dir() -> PathBuf {
        PathBuf::from("sample-data")
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            channel_capacity: Self::default_channel_capacity(),
            data_dir: Self::default_data_dir(),
        }
    }
}

impl Config {
    const fn default_precision() -> usize {
        8
    }

    const fn default_max_distance_iterations() -> usize {
        200
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        assert!(
            (1..=MAX_PRECISION).contains(&precision),
            "Precision must be between 1 and {MAX_PRECISION}"
        );
        self.precision = precision;
        self
    }

    pub fn with_max_distance_iterations(mut self, iterations: usize) -> Self {
        assert!(iterations > 0, "Iteration limit must be greater than zero");
        self.max_distance_iterations = iterations;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be greater than zero");

        if capacity > 10_000 {
            log::warn!(
                "Channel capacity of {} removes most of the ingestion backpressure; \
                parsed records may pile up in memory.",
                capacity
            );
        }

        self.ingest.channel_capacity = capacity;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ingest.data_dir = dir.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_PRECISION).contains(&self.precision) {
            return Err(format!(
                "Precision must be between 1 and {MAX_PRECISION}, got {}",
                self.precision
            ));
        }

        if self.max_distance_iterations == 0 {
            return Err("Iteration limit must be greater than zero".to_string());
        }

        if self.ingest.channel_capacity == 0 {
            return Err("Channel capacity must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            precision: Self::default_precision(),
            max_distance_iterations: Self::default_max_distance_iterations(),
            ingest: IngestConfig::default(),
        }
    }
}
