//! Store records and index statistics.

use crate::error::{Result, StoreError};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A store location.
///
/// The JSON shape matches the persisted source format:
///
/// ```json
/// {"store_id": 1, "name": "Plaza Hollywood", "city": "Hong Kong",
///  "country": "CN", "latitude": 22.3407, "longitude": 114.2017}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    #[serde(rename = "store_id")]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Set by the index when the record is inserted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<SystemTime>,
}

impl StoreRecord {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            city: city.into(),
            country: country.into(),
            latitude,
            longitude,
            created: None,
        }
    }

    /// Convert a generic decoded JSON object into a typed record.
    ///
    /// Missing or mistyped `store_id`, `latitude` or `longitude` fields fail
    /// with [`StoreError::Decoding`].
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| StoreError::Decoding(e.to_string()))
    }

    /// Location as a `geo` point (x = longitude, y = latitude).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Point-in-time snapshot of the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Stores currently held
    pub count: usize,
    /// Distinct spatial buckets in use
    pub bucket_count: usize,
    /// Set once the initial ingestion run has completed
    pub ready: bool,
    /// Inserts refused as duplicates or for unhashable coordinates
    pub rejected: u64,
    /// Source elements dropped because they could not be converted
    pub malformed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let value = json!({
            "city": "Hong Kong",
            "name": "Plaza Hollywood",
            "country": "CN",
            "longitude": 114.20169067382812,
            "latitude": 22.340700149536133,
            "store_id": 1
        });

        let store = StoreRecord::from_value(value).unwrap();
        assert_eq!(store.id, 1);
        assert_eq!(store.name, "Plaza Hollywood");
        assert_eq!(store.city, "Hong Kong");
        assert_eq!(store.country, "CN");
        assert!(store.created.is_none());
        assert_eq!(store.point().x(), 114.20169067382812);
        assert_eq!(store.point().y(), 22.340700149536133);
    }

    #[test]
    fn test_from_value_defaults_text_fields() {
        let store = StoreRecord::from_value(json!({
            "store_id": 7,
            "latitude": 1.0,
            "longitude": 2.0
        }))
        .unwrap();
        assert_eq!(store.name, "");
        assert_eq!(store.country, "");
    }

    #[test]
    fn test_from_value_rejects_malformed() {
        let missing_id = json!({"name": "x", "latitude": 1.0, "longitude": 2.0});
        assert!(matches!(
            StoreRecord::from_value(missing_id),
            Err(StoreError::Decoding(_))
        ));

        let bad_lat = json!({"store_id": 1, "latitude": "north", "longitude": 2.0});
        assert!(StoreRecord::from_value(bad_lat).is_err());

        let negative_id = json!({"store_id": -3, "latitude": 1.0, "longitude": 2.0});
        assert!(StoreRecord::from_value(negative_id).is_err());

        assert!(StoreRecord::from_value(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_serialize_uses_source_field_names() {
        let store = StoreRecord::new(13, "Hong Kong Station", "Hong Kong", "CN", 22.28, 114.15);
        let value = serde_json::to_value(&store).unwrap();
        assert_eq!(value["store_id"], 13);
        assert!(value.get("created").is_none());
    }
}
