//! Work items flowing through the pipeline
//!
//! A `WorkItem` only gains fields as it moves forward: the state parameter
//! goes `Pending -> Fingerprinted -> Located`, each transition consumes the
//! previous value, and the accessors for a stage's output exist only on the
//! states after that stage. The record id never changes.

use crate::storage::ObjectKey;
use crate::store::{PendingRecord, RecordId};
use durablewit_common::Fingerprint;
use std::fmt;
use std::path::{Path, PathBuf};

pub type PendingItem = WorkItem<Pending>;
pub type FingerprintedItem = WorkItem<Fingerprinted>;
pub type LocatedItem = WorkItem<Located>;

#[derive(Debug)]
pub struct WorkItem<S> {
    record_id: RecordId,
    local_relative_path: String,
    original_url: String,
    state: S,
}

/// Freshly enumerated, nothing computed yet
#[derive(Debug)]
pub struct Pending;

#[derive(Debug)]
pub struct Fingerprinted {
    fingerprint: Fingerprint,
    resolved_path: PathBuf,
}

#[derive(Debug)]
pub struct Located {
    fingerprint: Fingerprint,
    resolved_path: PathBuf,
    key: ObjectKey,
    location: String,
    placement: Placement,
}

/// How the object behind a location came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Already stored under the key; nothing was sent
    Reused,
    Uploaded,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Reused => f.write_str("reused"),
            Placement::Uploaded => f.write_str("uploaded"),
        }
    }
}

impl<S> WorkItem<S> {
    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn local_relative_path(&self) -> &str {
        &self.local_relative_path
    }

    /// Reference the record had when it was enumerated
    pub fn original_url(&self) -> &str {
        &self.original_url
    }
}

impl WorkItem<Pending> {
    pub fn new(record: PendingRecord) -> Self {
        Self {
            record_id: record.id,
            local_relative_path: record.cache_file,
            original_url: record.url,
            state: Pending,
        }
    }

    pub fn fingerprinted(self, fingerprint: Fingerprint, resolved_path: PathBuf) -> FingerprintedItem {
        WorkItem {
            record_id: self.record_id,
            local_relative_path: self.local_relative_path,
            original_url: self.original_url,
            state: Fingerprinted {
                fingerprint,
                resolved_path,
            },
        }
    }
}

impl WorkItem<Fingerprinted> {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.state.fingerprint
    }

    pub fn resolved_path(&self) -> &Path {
        &self.state.resolved_path
    }

    pub fn located(self, key: ObjectKey, location: String, placement: Placement) -> LocatedItem {
        WorkItem {
            record_id: self.record_id,
            local_relative_path: self.local_relative_path,
            original_url: self.original_url,
            state: Located {
                fingerprint: self.state.fingerprint,
                resolved_path: self.state.resolved_path,
                key,
                location,
                placement,
            },
        }
    }
}

impl WorkItem<Located> {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.state.fingerprint
    }

    pub fn resolved_path(&self) -> &Path {
        &self.state.resolved_path
    }

    pub fn key(&self) -> &ObjectKey {
        &self.state.key
    }

    /// Location the record will be pointed at
    pub fn new_location(&self) -> &str {
        &self.state.location
    }

    pub fn placement(&self) -> Placement {
        self.state.placement
    }
}
