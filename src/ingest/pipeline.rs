//! Two-stage streaming ingestion.
//!
//! ```text
//! RecordSource ──bytes──▶ parse stage ──mpsc(capacity)──▶ insert stage ──▶ SpatialIndex
//!                        (spawn_blocking)                 (tokio task)
//! ```
//!
//! The parse stage walks the top-level JSON array with a serde `SeqAccess`
//! visitor, so at most one element is decoded at a time, and pushes typed
//! records into a small bounded channel. When the channel is full the parse
//! stage blocks, which keeps memory flat no matter how large the source is.
//!
//! Both stages watch a shared [`CancellationToken`] on every iteration and
//! report how they ended through their join handles. The orchestrator marks
//! the index ready only when both stages report [`StageOutcome::Completed`].

use crate::config::IngestConfig;
use crate::error::{Result, StoreError};
use crate::index::SpatialIndex;
use crate::ingest::source::RecordSource;
use crate::types::{IndexStats, StoreRecord};
use serde::Deserializer as _;
use serde::de::{SeqAccess, Visitor};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a pipeline stage finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage consumed all of its input.
    Completed,
    /// The stage stopped early after observing cancellation.
    Cancelled,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// Array elements read from the source
    pub decoded: u64,
    /// Records accepted by the index
    pub inserted: u64,
    /// Records the index refused (duplicate id or unhashable coordinates)
    pub rejected: u64,
    /// Elements that could not be converted into a store record
    pub malformed: u64,
    /// `Completed` only when both stages completed
    pub outcome: StageOutcome,
    /// Index statistics after the run
    pub stats: IndexStats,
}

#[derive(Debug)]
struct ParseSummary {
    outcome: StageOutcome,
    decoded: u64,
    malformed: u64,
}

#[derive(Debug)]
struct InsertSummary {
    outcome: StageOutcome,
    inserted: u64,
    rejected: u64,
}

/// Handle to a running ingestion.
///
/// Dropping the handle detaches the run; it keeps going in the background and
/// its completion shows up as `IndexStats::ready`.
#[derive(Debug)]
pub struct IngestionHandle {
    task: JoinHandle<Result<IngestReport>>,
    cancel: CancellationToken,
}

impl IngestionHandle {
    /// Ask both stages to stop. Records already inserted stay in the index.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to end.
    ///
    /// Returns the fatal error when the source was missing, unreadable or
    /// structurally invalid. A run stopped through [`cancel`](Self::cancel)
    /// returns a report whose outcome is [`StageOutcome::Cancelled`].
    pub async fn wait(self) -> Result<IngestReport> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(StoreError::Cancelled),
            Err(e) => Err(StoreError::Task(e.to_string())),
        }
    }
}

/// Start ingesting the source document `name` into `index`.
///
/// Must be called from within a tokio runtime.
pub fn start_ingestion(
    index: Arc<SpatialIndex>,
    source: Arc<dyn RecordSource>,
    name: impl Into<String>,
    config: &IngestConfig,
) -> IngestionHandle {
    let name = name.into();
    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));

    log::info!("starting ingestion of {}", name);

    let parse = {
        let index = Arc::clone(&index);
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || parse_stage(source.as_ref(), &name, &index, tx, &cancel))
    };
    let insert = tokio::spawn(insert_stage(Arc::clone(&index), rx, cancel.clone()));
    let task = tokio::spawn(orchestrate(index, parse, insert, cancel.clone()));

    IngestionHandle { task, cancel }
}

async fn orchestrate(
    index: Arc<SpatialIndex>,
    parse: JoinHandle<Result<ParseSummary>>,
    insert: JoinHandle<Result<InsertSummary>>,
    cancel: CancellationToken,
) -> Result<IngestReport> {
    let (parsed, inserted) = tokio::join!(parse, insert);

    let (parsed, inserted) = match (parsed, inserted) {
        (Ok(parsed), Ok(inserted)) => (parsed, inserted),
        (Err(e), _) | (_, Err(e)) => {
            cancel.cancel();
            log::error!("ingestion task failed: {}", e);
            return Err(StoreError::Task(e.to_string()));
        }
    };

    let (parsed, inserted) = match (parsed, inserted) {
        (Ok(parsed), Ok(inserted)) => (parsed, inserted),
        (Err(e), _) | (_, Err(e)) => {
            log::error!(
                "ingestion aborted with {} stores indexed: {}",
                index.len(),
                e
            );
            return Err(e);
        }
    };

    let outcome = if parsed.outcome == StageOutcome::Completed
        && inserted.outcome == StageOutcome::Completed
    {
        index.set_ready();
        StageOutcome::Completed
    } else {
        StageOutcome::Cancelled
    };

    let stats = index.stats();
    match outcome {
        StageOutcome::Completed => log::info!("finished setting up store data: {:?}", stats),
        StageOutcome::Cancelled => log::info!("store data ingestion cancelled: {:?}", stats),
    }

    Ok(IngestReport {
        decoded: parsed.decoded,
        inserted: inserted.inserted,
        rejected: inserted.rejected,
        malformed: parsed.malformed,
        outcome,
        stats,
    })
}

fn parse_stage(
    source: &dyn RecordSource,
    name: &str,
    index: &SpatialIndex,
    tx: mpsc::Sender<StoreRecord>,
    cancel: &CancellationToken,
) -> Result<ParseSummary> {
    log::info!("start reading store data from {}", name);

    let reader = match source.open(name) {
        Ok(reader) => reader,
        Err(e) => {
            log::error!("error opening store data {}: {}", name, e);
            cancel.cancel();
            return Err(e);
        }
    };

    let mut summary = ParseSummary {
        outcome: StageOutcome::Completed,
        decoded: 0,
        malformed: 0,
    };

    let mut de = serde_json::Deserializer::from_reader(reader);
    let result = (&mut de).deserialize_seq(StoreArrayVisitor {
        index,
        tx: &tx,
        cancel,
        summary: &mut summary,
    });

    // Leaving the array early makes serde_json complain about the unread
    // tail; that is expected once we have been cancelled.
    if summary.outcome == StageOutcome::Cancelled {
        log::info!("store data read cancelled after {} records", summary.decoded);
        return Ok(summary);
    }

    if let Err(e) = result.and_then(|()| de.end()) {
        log::error!("error decoding store data {}: {}", name, e);
        cancel.cancel();
        return Err(structural_error(e));
    }

    log::info!("finished reading {} records from {}", summary.decoded, name);
    Ok(summary)
}

fn structural_error(e: serde_json::Error) -> StoreError {
    if e.is_io() {
        StoreError::Io(e.into())
    } else {
        StoreError::Json(e)
    }
}

struct StoreArrayVisitor<'a> {
    index: &'a SpatialIndex,
    tx: &'a mpsc::Sender<StoreRecord>,
    cancel: &'a CancellationToken,
    summary: &'a mut ParseSummary,
}

impl<'de> Visitor<'de> for StoreArrayVisitor<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of store objects")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        loop {
            if self.cancel.is_cancelled() {
                self.summary.outcome = StageOutcome::Cancelled;
                return Ok(());
            }

            let Some(value) = seq.next_element::<serde_json::Value>()? else {
                break;
            };
            self.summary.decoded += 1;

            match StoreRecord::from_value(value) {
                Ok(record) => {
                    // The insert stage dropped its receiver, so it has stopped.
                    if self.tx.blocking_send(record).is_err() {
                        self.summary.outcome = StageOutcome::Cancelled;
                        return Ok(());
                    }
                }
                Err(e) => {
                    log::error!(
                        "error processing store data at element {}: {}",
                        self.summary.decoded,
                        e
                    );
                    self.summary.malformed += 1;
                    self.index.record_malformed();
                }
            }
        }

        Ok(())
    }
}

async fn insert_stage(
    index: Arc<SpatialIndex>,
    mut rx: mpsc::Receiver<StoreRecord>,
    cancel: CancellationToken,
) -> Result<InsertSummary> {
    log::info!("start updating store data");

    let mut summary = InsertSummary {
        outcome: StageOutcome::Cancelled,
        inserted: 0,
        rejected: 0,
    };

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                log::info!("store data update cancelled after {} inserts", summary.inserted);
                return Ok(summary);
            }
            received = rx.recv() => match received {
                Some(record) => {
                    let id = record.id;
                    match index.insert(record) {
                        Ok(()) => summary.inserted += 1,
                        Err(e) if e.is_recoverable() => {
                            log::warn!("error adding store {}: {}", id, e);
                            summary.rejected += 1;
                        }
                        Err(e) => {
                            log::error!("fatal error adding store {}: {}", id, e);
                            cancel.cancel();
                            return Err(e);
                        }
                    }
                }
                None => {
                    log::info!("store channel closed after {} inserts", summary.inserted);
                    summary.outcome = StageOutcome::Completed;
                    return Ok(summary);
                }
            },
        }
    }
}
