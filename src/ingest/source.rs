//! Record sources feeding the ingestion pipeline.
//!
//! A source turns a logical name into a byte stream holding a JSON array of
//! store objects. The pipeline decodes that stream incrementally, so a source
//! never has to hold the whole document in memory.

use crate::error::{Result, StoreError};
use bytes::{Buf, Bytes};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

pub type RecordReader = Box<dyn Read + Send>;

/// Capability to open a named record stream.
pub trait RecordSource: Send + Sync {
    /// Open `name` for reading.
    ///
    /// Fails with [`StoreError::SourceNotFound`] when nothing exists under
    /// that name and with [`StoreError::Io`] when it exists but cannot be
    /// read.
    fn open(&self, name: &str) -> Result<RecordReader>;
}

/// Resolves names to files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl RecordSource for FileSource {
    fn open(&self, name: &str) -> Result<RecordReader> {
        let path = self.path(name);

        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {
                log::error!("record source {} is a directory", path.display());
                return Err(StoreError::Io(io::Error::other(format!(
                    "{} is a directory",
                    path.display()
                ))));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::error!("file {} doesn't exist", path.display());
                return Err(StoreError::SourceNotFound(path.display().to_string()));
            }
            Err(e) => {
                log::error!("unable to access file {}: {}", path.display(), e);
                return Err(StoreError::Io(e));
            }
        }

        let file = File::open(&path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Named in-memory documents.
#[derive(Default)]
pub struct MemorySource {
    documents: RwLock<FxHashMap<String, Bytes>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the document served under `name`.
    pub fn insert(&self, name: impl Into<String>, document: impl Into<Bytes>) {
        self.documents.write().insert(name.into(), document.into());
    }

    pub fn with_document(self, name: impl Into<String>, document: impl Into<Bytes>) -> Self {
        self.insert(name, document);
        self
    }
}

impl RecordSource for MemorySource {
    fn open(&self, name: &str) -> Result<RecordReader> {
        let document = self
            .documents
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::SourceNotFound(name.to_string()))?;
        Ok(Box::new(document.reader()))
    }
}
