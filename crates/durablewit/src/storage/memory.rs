//! In-process object store
//!
//! Behaves like a bucket for the pipeline (existence, idempotent puts,
//! deterministic locations) and records what happened so tests can assert on
//! upload counts.

use super::{ObjectKey, ObjectStore, PutOptions};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub public_read: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    bucket: String,
    objects: Mutex<HashMap<ObjectKey, StoredObject>>,
    puts: AtomicUsize,
    fail_puts: AtomicBool,
    fail_exists: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Make every subsequent upload fail as if the transport broke
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent existence check fail
    pub fn fail_existence_checks(&self, fail: bool) {
        self.fail_exists.store(fail, Ordering::SeqCst);
    }

    /// Number of `put_object` calls that stored bytes
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn object_count(&self) -> usize {
        self.lock().len()
    }

    pub fn get(&self, key: &ObjectKey) -> Option<StoredObject> {
        self.lock().get(key).cloned()
    }

    /// Look an object up by the location `location_for` handed out
    pub fn get_by_location(&self, location: &str) -> Option<StoredObject> {
        let key = location.strip_prefix(&self.location_prefix())?;
        self.get(&ObjectKey(key.to_string()))
    }

    fn location_prefix(&self) -> String {
        format!("memory://{}/", self.bucket)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ObjectKey, StoredObject>> {
        // A panic while holding the lock cannot leave the map half-written
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn store_id(&self) -> &str {
        &self.bucket
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool> {
        if self.fail_exists.load(Ordering::SeqCst) {
            bail!("simulated existence check failure for {}", key);
        }
        Ok(self.lock().contains_key(key))
    }

    async fn put_object(&self, key: &ObjectKey, path: &Path, options: PutOptions<'_>) -> Result<String> {
        if self.fail_puts.load(Ordering::SeqCst) {
            bail!("simulated upload failure for {}", key);
        }

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to open {} for upload", path.display()))?;

        self.lock().insert(
            key.clone(),
            StoredObject {
                bytes,
                content_type: options.content_type.to_string(),
                public_read: options.public_read,
            },
        );
        self.puts.fetch_add(1, Ordering::SeqCst);

        Ok(self.location_for(key))
    }

    fn location_for(&self, key: &ObjectKey) -> String {
        format!("{}{}", self.location_prefix(), key)
    }
}
