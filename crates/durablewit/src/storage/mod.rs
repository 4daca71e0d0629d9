//! Content-addressed object storage
//!
//! Objects are keyed by content fingerprint plus format tag, so the key alone
//! says whether the bytes are already stored. The [`ObjectStore`] trait is
//! the seam between the upload stage and S3; [`memory::InMemoryObjectStore`]
//! stands in for S3 in tests.

use crate::media::ImageFormat;
use anyhow::Result;
use async_trait::async_trait;
use durablewit_common::Fingerprint;
use std::fmt;
use std::path::Path;

pub mod config;
pub mod memory;
pub mod s3;

/// Remote object key derived from content, independent of any filename
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// `{fingerprint}.{tag}`, or the bare fingerprint when the format is unknown
    pub fn for_content(fingerprint: &Fingerprint, format: Option<ImageFormat>) -> Self {
        match format {
            Some(format) => Self(format!("{}.{}", fingerprint, format.tag())),
            None => Self(fingerprint.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upload parameters for one object
#[derive(Debug, Clone, Copy)]
pub struct PutOptions<'a> {
    pub content_type: &'a str,
    pub public_read: bool,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket (or equivalent) name; records containing it count as migrated
    fn store_id(&self) -> &str;

    /// Whether an object already exists under `key`
    async fn exists(&self, key: &ObjectKey) -> Result<bool>;

    /// Stream the file at `path` to a new object under `key` and return its
    /// location. Writing the same bytes under the same key twice is harmless.
    async fn put_object(&self, key: &ObjectKey, path: &Path, options: PutOptions<'_>) -> Result<String>;

    /// Canonical public location of `key`, built without a round trip
    fn location_for(&self, key: &ObjectKey) -> String;
}
