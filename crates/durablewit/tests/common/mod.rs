//! Shared fixtures: a throwaway gifwit library on disk

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use durablewit::config::DATABASE_FILE_NAME;
use durablewit::media::MagicSniffer;
use durablewit::pipeline::{PipelineContext, PipelineSettings};
use durablewit::storage::memory::InMemoryObjectStore;
use durablewit::store::{RecordId, RecordStore, SqliteRecordStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const BUCKET: &str = "durablewit";

/// Smallest valid GIF: one white pixel
pub const GIF_A: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";

/// Same header, different pixel data
pub const GIF_B: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\x00\x00\x00\xff\xff\xff!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02L\x01\x00;";

pub const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

/// One `ZIMAGE` row
pub struct Row<'a> {
    pub id: i64,
    pub cache_file: Option<&'a str>,
    pub url: Option<&'a str>,
    pub downloaded: bool,
}

impl<'a> Row<'a> {
    pub fn downloaded(id: i64, cache_file: &'a str) -> Self {
        Self {
            id,
            cache_file: Some(cache_file),
            url: Some("http://giphy.com/original.gif"),
            downloaded: true,
        }
    }

    pub fn with_url(mut self, url: Option<&'a str>) -> Self {
        self.url = url;
        self
    }

    pub fn not_downloaded(mut self) -> Self {
        self.downloaded = false;
        self
    }
}

pub struct Library {
    pub dir: TempDir,
    pub records: Arc<SqliteRecordStore>,
}

impl Library {
    pub async fn with_rows(rows: &[Row<'_>]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATABASE_FILE_NAME);

        let seed = SqlitePool::connect_with(SqliteConnectOptions::new().filename(&path).create_if_missing(true))
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE ZIMAGE (Z_PK INTEGER PRIMARY KEY, ZCACHE_FILE VARCHAR, ZURL VARCHAR, ZDOWNLOADED INTEGER)",
        )
        .execute(&seed)
        .await
        .unwrap();

        for row in rows {
            sqlx::query("INSERT INTO ZIMAGE (Z_PK, ZCACHE_FILE, ZURL, ZDOWNLOADED) VALUES (?1, ?2, ?3, ?4)")
                .bind(row.id)
                .bind(row.cache_file)
                .bind(row.url)
                .bind(i64::from(row.downloaded))
                .execute(&seed)
                .await
                .unwrap();
        }
        seed.close().await;

        let records = Arc::new(SqliteRecordStore::open(&path).await.unwrap());
        Self { dir, records }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    pub async fn url(&self, id: i64) -> String {
        self.records.reference(RecordId(id)).await.unwrap().unwrap()
    }

    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings::new(self.path())
            .with_workers(4)
            .with_queue_capacity(4)
    }

    pub fn context(&self, objects: &Arc<InMemoryObjectStore>) -> PipelineContext {
        self.context_with(self.records.clone(), objects)
    }

    pub fn context_with(&self, records: Arc<dyn RecordStore>, objects: &Arc<InMemoryObjectStore>) -> PipelineContext {
        PipelineContext {
            records,
            objects: objects.clone(),
            sniffer: Arc::new(MagicSniffer),
        }
    }
}

pub fn memory_store() -> Arc<InMemoryObjectStore> {
    Arc::new(InMemoryObjectStore::new(BUCKET))
}

/// Capture pipeline logs when a test fails
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("durablewit=debug")
        .with_test_writer()
        .try_init();
}
