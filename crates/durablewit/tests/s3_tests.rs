//! S3 object store integration tests
//!
//! **Requirements**:
//! - MinIO or S3 must be running and accessible
//! - S3_ENDPOINT environment variable must be set (e.g., "http://localhost:9000")
//! - Tests are skipped when S3_ENDPOINT is not configured
//!
//! **Running tests**:
//! ```bash
//! S3_ENDPOINT=http://localhost:9000 S3_PATH_STYLE=true \
//!   S3_ACCESS_KEY=minioadmin S3_SECRET_KEY=minioadmin \
//!   cargo test --test s3_tests
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Library, Row, GIF_A};
use durablewit::media::{ImageFormat, MagicSniffer};
use durablewit::pipeline::{self, PipelineContext, PipelineSettings};
use durablewit::storage::config::StorageConfig;
use durablewit::storage::s3::S3ObjectStore;
use durablewit::storage::{ObjectKey, ObjectStore, PutOptions};
use durablewit_common::Fingerprint;
use serial_test::serial;
use std::sync::Arc;

/// Store for the configured endpoint with its bucket ready, or `None` when
/// no endpoint is configured
async fn setup_store() -> Option<S3ObjectStore> {
    if std::env::var("S3_ENDPOINT").is_err() {
        return None;
    }

    let store = match S3ObjectStore::new(StorageConfig::from_env()).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to create storage client: {:#}", e);
            return None;
        },
    };

    store.ensure_bucket().await.unwrap();
    Some(store)
}

#[tokio::test]
#[serial]
async fn test_bucket_setup_is_repeatable() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test: S3_ENDPOINT not configured");
        return;
    };

    // Already owned by us, so a second attempt succeeds without creating anything
    store.ensure_bucket().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_put_then_exists() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test: S3_ENDPOINT not configured");
        return;
    };

    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, GIF_A).unwrap();

    // Unique per run so a previous run's object cannot satisfy the check
    let nonce = format!("{:?}", std::time::SystemTime::now());
    let fingerprint = Fingerprint::from_bytes(nonce.as_bytes());
    let key = ObjectKey::for_content(&fingerprint, Some(ImageFormat::Gif));

    assert!(!store.exists(&key).await.unwrap());

    let location = store
        .put_object(
            &key,
            file.path(),
            PutOptions {
                content_type: "image/gif",
                public_read: true,
            },
        )
        .await
        .unwrap();

    assert!(store.exists(&key).await.unwrap());
    assert_eq!(location, store.location_for(&key));
    assert!(location.ends_with(&format!("/{}/{}", store.store_id(), key)));
}

#[tokio::test]
#[serial]
async fn test_pipeline_against_s3() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test: S3_ENDPOINT not configured");
        return;
    };
    let bucket = store.store_id().to_string();

    let library = Library::with_rows(&[Row::downloaded(1, "a.gif"), Row::downloaded(2, "b.gif")]).await;
    library.write_file("a.gif", GIF_A);
    library.write_file("b.gif", GIF_A);

    let context = PipelineContext {
        records: library.records.clone(),
        objects: Arc::new(store),
        sniffer: Arc::new(MagicSniffer),
    };
    let summary = pipeline::run(context.clone(), PipelineSettings::new(library.path()))
        .await
        .unwrap();

    assert_eq!(summary.persisted, 2);
    let location = library.url(1).await;
    assert_eq!(location, library.url(2).await);
    assert!(location.contains(&bucket));

    let again = pipeline::run(context, PipelineSettings::new(library.path()))
        .await
        .unwrap();
    assert_eq!(again.enumerated, 0);
}
