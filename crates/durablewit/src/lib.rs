//! durablewit
//!
//! Moves the images cached by a gifwit library into S3 and points every
//! library record at its durable copy.
//!
//! # Overview
//!
//! A run is a four stage pipeline joined by bounded queues:
//!
//! 1. **Enumerate** pending records from the library database
//! 2. **Fingerprint** each cached file (SHA-256, pooled)
//! 3. **Upload** content that is not already stored under its fingerprint key (pooled)
//! 4. **Persist** the new location back into the record (single writer)
//!
//! Byte-identical images share one object, and records that already point at
//! the target bucket are never picked up again, so repeated runs are cheap.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use durablewit::pipeline::{self, PipelineContext, PipelineSettings};
//! use durablewit::media::MagicSniffer;
//! use durablewit::storage::{config::StorageConfig, s3::S3ObjectStore};
//! use durablewit::store::SqliteRecordStore;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let records = SqliteRecordStore::open("gifwit.storedata".as_ref()).await?;
//! let objects = S3ObjectStore::new(StorageConfig::from_env()).await?;
//!
//! let context = PipelineContext {
//!     records: Arc::new(records),
//!     objects: Arc::new(objects),
//!     sniffer: Arc::new(MagicSniffer),
//! };
//! let settings = PipelineSettings::new("/path/to/library");
//! let summary = pipeline::run(context, settings).await?;
//! println!("{} records migrated", summary.persisted);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod paths;
pub mod pipeline;
pub mod storage;
pub mod store;

pub use error::{PipelineError, Result};
