//! The migration pipeline
//!
//! ```text
//! enumerate ──q1──▶ fingerprint ×N ──q2──▶ upload ×N ──q3──▶ persist
//! ```
//!
//! Every queue is bounded. `q1` has one producer and closes when the
//! enumerator returns; `q2` and `q3` have a pool of producers and are closed
//! by a [`ShutdownCoordinator`](coordinator::ShutdownCoordinator) once the
//! whole pool is done. Per-record problems are logged and the record is
//! dropped; anything returned as a [`PipelineError`] stops the run.

mod coordinator;
mod enumerate;
mod fingerprint;
pub mod item;
mod persist;
mod queue;
mod stats;
mod upload;

pub use stats::MigrationSummary;

use crate::config::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
use crate::error::{PipelineError, Result};
use crate::media::FormatSniffer;
use crate::storage::ObjectStore;
use crate::store::RecordStore;
use coordinator::{panic_message, ShutdownCoordinator};
use item::{FingerprintedItem, LocatedItem, PendingItem};
use queue::stage_queue;
use stats::PipelineStats;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::info;

/// Collaborators a run talks to
#[derive(Clone)]
pub struct PipelineContext {
    pub records: Arc<dyn RecordStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub sniffer: Arc<dyn FormatSniffer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Directory cached file names are relative to
    pub library_dir: PathBuf,
    /// Width of the fingerprint pool and of the upload pool
    pub workers: usize,
    pub queue_capacity: usize,
}

impl PipelineSettings {
    pub fn new(library_dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: library_dir.into(),
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PipelineError::config("workers must be greater than 0"));
        }
        if self.queue_capacity == 0 {
            return Err(PipelineError::config("queue capacity must be greater than 0"));
        }
        Ok(())
    }
}

/// Run one migration to completion.
///
/// Returns once the writer has drained its queue, or with the first fatal
/// error. On a fatal error every stage is aborted; updates already applied
/// stay applied, and the next run picks up whatever is left.
///
/// Records whose reference already contains the object store's id are
/// treated as migrated and never enumerated.
pub async fn run(context: PipelineContext, settings: PipelineSettings) -> Result<MigrationSummary> {
    settings.validate()?;
    let library_dir = resolve_library_dir(&settings.library_dir)?;

    let exclude = context.objects.store_id().to_string();
    if exclude.is_empty() {
        // An empty marker is contained in every reference and would hide every record
        return Err(PipelineError::config("object store id cannot be empty"));
    }

    info!(
        library = %library_dir.display(),
        exclude = %exclude,
        workers = settings.workers,
        queue_capacity = settings.queue_capacity,
        "Starting migration"
    );
    let started = Instant::now();

    let stats = Arc::new(PipelineStats::default());
    let (pending_tx, pending_rx) = stage_queue::<PendingItem>(settings.queue_capacity);
    let (fingerprinted_tx, fingerprinted_rx) = stage_queue::<FingerprintedItem>(settings.queue_capacity);
    let (located_tx, located_rx) = mpsc::channel::<LocatedItem>(settings.queue_capacity);

    let mut fingerprint_pool = ShutdownCoordinator::new("fingerprint", fingerprinted_tx);
    for worker in 0..settings.workers {
        let output = fingerprint_pool.sender();
        fingerprint_pool.spawn(fingerprint::worker(
            worker,
            Arc::clone(&library_dir),
            pending_rx.clone(),
            output,
            Arc::clone(&stats),
        ));
    }
    drop(pending_rx);

    let mut upload_pool = ShutdownCoordinator::new("upload", located_tx);
    for worker in 0..settings.workers {
        let output = upload_pool.sender();
        upload_pool.spawn(upload::worker(
            worker,
            Arc::clone(&context.objects),
            Arc::clone(&context.sniffer),
            fingerprinted_rx.clone(),
            output,
            Arc::clone(&stats),
        ));
    }
    drop(fingerprinted_rx);

    let mut stages: JoinSet<Result<()>> = JoinSet::new();
    stages.spawn(enumerate::run(
        Arc::clone(&context.records),
        exclude,
        pending_tx,
        Arc::clone(&stats),
    ));
    stages.spawn(fingerprint_pool.wait_and_close());
    stages.spawn(upload_pool.wait_and_close());
    stages.spawn(persist::run(Arc::clone(&context.records), located_rx, Arc::clone(&stats)));

    // A closed stage is only ever the echo of a failure further down, so it
    // is reported only if nothing else went wrong.
    let mut closed = None;
    while let Some(joined) = stages.join_next().await {
        let err = match joined {
            Ok(Ok(())) => continue,
            Ok(Err(err @ PipelineError::StageClosed { .. })) => {
                if closed.is_none() {
                    closed = Some(err);
                }
                continue;
            },
            Ok(Err(err)) => err,
            Err(join_err) => PipelineError::WorkerPanicked {
                stage: "pipeline",
                message: if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    "stage was cancelled".to_string()
                },
            },
        };

        stages.abort_all();
        return Err(err);
    }

    if let Some(err) = closed {
        return Err(err);
    }

    let summary = stats.summary();
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        enumerated = summary.enumerated,
        uploaded = summary.uploaded,
        reused = summary.reused,
        persisted = summary.persisted,
        missing = summary.missing,
        failed = summary.failed,
        stale = summary.stale,
        "Migration finished"
    );
    Ok(summary)
}

fn resolve_library_dir(dir: &Path) -> Result<Arc<Path>> {
    let absolute = std::path::absolute(dir)
        .map_err(|e| PipelineError::config(format!("cannot resolve library directory {}: {e}", dir.display())))?;
    Ok(Arc::from(absolute))
}
