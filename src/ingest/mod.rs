//! Streaming ingestion of store records into the spatial index.

pub mod pipeline;
pub mod source;

pub use pipeline::{IngestReport, IngestionHandle, StageOutcome, start_ingestion};
pub use source::{FileSource, MemorySource, RecordReader, RecordSource};
