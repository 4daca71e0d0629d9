use std::sync::atomic::{AtomicU64, Ordering};

/// Something that happened to a record during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Enumerated,
    /// No cached file on disk
    Missing,
    Fingerprinted,
    Reused,
    Uploaded,
    /// Dropped after a non-fatal read or storage failure
    Failed,
    Persisted,
    /// Update matched no row
    Stale,
}

/// Counters shared by every stage of one run
#[derive(Debug, Default)]
pub(crate) struct PipelineStats {
    enumerated: AtomicU64,
    missing: AtomicU64,
    fingerprinted: AtomicU64,
    reused: AtomicU64,
    uploaded: AtomicU64,
    failed: AtomicU64,
    persisted: AtomicU64,
    stale: AtomicU64,
}

impl PipelineStats {
    pub fn record(&self, event: Event) {
        let counter = match event {
            Event::Enumerated => &self.enumerated,
            Event::Missing => &self.missing,
            Event::Fingerprinted => &self.fingerprinted,
            Event::Reused => &self.reused,
            Event::Uploaded => &self.uploaded,
            Event::Failed => &self.failed,
            Event::Persisted => &self.persisted,
            Event::Stale => &self.stale,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> MigrationSummary {
        MigrationSummary {
            enumerated: self.enumerated.load(Ordering::Relaxed),
            missing: self.missing.load(Ordering::Relaxed),
            fingerprinted: self.fingerprinted.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            uploaded: self.uploaded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
        }
    }
}

/// What a completed run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Records handed to the pipeline
    pub enumerated: u64,
    /// Records skipped because their cached file does not exist
    pub missing: u64,
    pub fingerprinted: u64,
    /// Records whose content was already stored
    pub reused: u64,
    /// Objects written to the store
    pub uploaded: u64,
    /// Records dropped after a read, existence check or upload failure
    pub failed: u64,
    /// Records now pointing at their stored object
    pub persisted: u64,
    /// Updates that matched no record
    pub stale: u64,
}
