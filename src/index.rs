//! Bucketed spatial index over store records.
//!
//! The index owns every [`StoreRecord`] in an id-keyed map and keeps a
//! secondary map from bucket key to the ids hashed into that bucket, in
//! insertion order. One reader/writer lock guards both maps together with the
//! counters and the readiness flag, so readers always observe a consistent
//! pair of maps.
//!
//! ```text
//! SpatialIndex
//! └─ RwLock<IndexState>
//!    ├─ stores:  FxHashMap<u32, StoreRecord>
//!    │  ├─ 1  -> Plaza Hollywood
//!    │  └─ 8  -> Telford Plaza
//!    ├─ buckets: FxHashMap<String, SmallVec<[u32; 4]>>
//!    │  └─ "cbacdddc" -> [1, 8]
//!    ├─ rejected / malformed counters
//!    └─ ready
//! ```

use crate::compute::quadhash;
use crate::error::{Result, StoreError};
use crate::types::{IndexStats, StoreRecord};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::time::SystemTime;

/// Default bucket-key precision for indexing and lookup
pub const DEFAULT_PRECISION: usize = 8;

type BucketIds = SmallVec<[u32; 4]>;

#[derive(Default)]
struct IndexState {
    stores: FxHashMap<u32, StoreRecord>,
    buckets: FxHashMap<String, BucketIds>,
    rejected: u64,
    malformed: u64,
    ready: bool,
}

/// Thread-safe store index keyed by id and bucketed by location.
///
/// Inserts take the write lock; every other operation takes the read lock.
///
/// # Examples
///
/// ```rust
/// use store_locator::{SpatialIndex, StoreRecord};
///
/// let index = SpatialIndex::new(8);
/// let store = StoreRecord::new(1, "Plaza Hollywood", "Hong Kong", "CN", 22.3407, 114.2017);
/// index.insert(store)?;
///
/// assert_eq!(index.get(1)?.name, "Plaza Hollywood");
/// assert_eq!(index.bucket_for(22.34, 114.20)?, vec![1]);
/// # Ok::<(), store_locator::StoreError>(())
/// ```
pub struct SpatialIndex {
    state: RwLock<IndexState>,
    precision: usize,
}

impl SpatialIndex {
    /// Create an empty index hashing at `precision` characters, clamped to
    /// `1..=12`.
    pub fn new(precision: usize) -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            precision: precision.clamp(1, quadhash::MAX_PRECISION),
        }
    }

    /// Bucket-key precision used by this index.
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Number of stores held.
    pub fn len(&self) -> usize {
        self.state.read().stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a store, stamping its `created` time.
    ///
    /// A duplicate id fails with [`StoreError::AlreadyExists`] and a point
    /// that cannot be hashed fails with [`StoreError::Encoding`]; neither
    /// touches the maps.
    pub fn insert(&self, mut record: StoreRecord) -> Result<()> {
        let mut state = self.state.write();

        if state.stores.contains_key(&record.id) {
            state.rejected += 1;
            return Err(StoreError::AlreadyExists(record.id));
        }

        let key = match quadhash::encode(record.latitude, record.longitude, self.precision) {
            Ok(key) => key,
            Err(e) => {
                state.rejected += 1;
                return Err(e);
            }
        };

        record.created = Some(SystemTime::now());
        state.buckets.entry(key).or_default().push(record.id);
        state.stores.insert(record.id, record);

        Ok(())
    }

    /// Look up a store by id.
    pub fn get(&self, id: u32) -> Result<StoreRecord> {
        self.state
            .read()
            .stores
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("store with id {id} doesn't exist")))
    }

    /// Ids hashed into the bucket containing `(lat, lon)`, in insertion order.
    ///
    /// An empty bucket is reported as [`StoreError::NotFound`]. Stores in a
    /// neighbouring bucket are never returned, even when they are close to
    /// the point.
    pub fn bucket_for(&self, lat: f64, lon: f64) -> Result<Vec<u32>> {
        let key = quadhash::encode(lat, lon, self.precision)?;
        let state = self.state.read();

        match state.buckets.get(&key) {
            Some(ids) if !ids.is_empty() => Ok(ids.to_vec()),
            _ => Err(no_stores_found(lat, lon)),
        }
    }

    /// Records in the bucket containing `(lat, lon)`, resolved under a single
    /// read lock so the ids and records come from the same snapshot.
    pub fn candidates(&self, lat: f64, lon: f64) -> Result<Vec<StoreRecord>> {
        let key = quadhash::encode(lat, lon, self.precision)?;
        let state = self.state.read();

        let ids = match state.buckets.get(&key) {
            Some(ids) if !ids.is_empty() => ids,
            _ => return Err(no_stores_found(lat, lon)),
        };

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match state.stores.get(id) {
                Some(record) => records.push(record.clone()),
                None => log::error!("bucket {} references missing store {}", key, id),
            }
        }

        Ok(records)
    }

    /// Point-in-time statistics.
    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            count: state.stores.len(),
            bucket_count: state.buckets.len(),
            ready: state.ready,
            rejected: state.rejected,
            malformed: state.malformed,
        }
    }

    /// Mark the initial ingestion run as finished. Only ever flips to true.
    pub(crate) fn set_ready(&self) {
        self.state.write().ready = true;
    }

    /// Count a source element dropped before it reached `insert`.
    pub(crate) fn record_malformed(&self) {
        self.state.write().malformed += 1;
    }

    /// Drop every store, bucket and counter. Intended for test isolation.
    pub fn reset(&self) {
        *self.state.write() = IndexState::default();
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

fn no_stores_found(lat: f64, lon: f64) -> StoreError {
    StoreError::NotFound(format!("no stores found for lat: {lat}, long: {lon}"))
}
