//! Record store access
//!
//! The gifwit library keeps its images in a Core Data SQLite file. Only two
//! queries matter here: listing the downloaded images that still point
//! somewhere other than the target bucket, and rewriting one image's URL.

use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Stable primary key of a library record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row eligible for migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    pub id: RecordId,
    /// Cache file name relative to the library directory; empty when unset
    pub cache_file: String,
    /// Reference before migration; empty when unset
    pub url: String,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Downloaded records whose reference does not contain `exclude`,
    /// ascending by id.
    async fn pending_records(&self, exclude: &str) -> Result<Vec<PendingRecord>>;

    /// Point one record at `url`, returning the number of rows changed.
    async fn update_reference(&self, id: RecordId, url: &str) -> Result<u64>;
}

/// Default busy timeout, matching what gifwit itself tolerates.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed gifwit library
///
/// The pool holds exactly one connection: the library file tolerates a
/// single writer and the writer stage is the only one that writes.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open an existing library database. A missing file is an error, never
    /// silently created.
    pub async fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT).await
    }

    pub async fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| PipelineError::OpenStore {
                path: path.display().to_string(),
                source,
            })?;

        info!(path = %path.display(), "Record store opened");

        Ok(Self { pool })
    }

    /// Current reference of a record, `None` when the record does not exist
    #[instrument(skip(self))]
    pub async fn reference(&self, id: RecordId) -> Result<Option<String>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT ZURL FROM ZIMAGE WHERE Z_PK = ?1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PipelineError::record_store("lookup", e))?;

        Ok(row.map(|(url,)| url.unwrap_or_default()))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self))]
    async fn pending_records(&self, exclude: &str) -> Result<Vec<PendingRecord>> {
        let rows: Vec<(i64, Option<String>, Option<String>)> = sqlx::query_as(
            r#"
            SELECT Z_PK, ZCACHE_FILE, ZURL
            FROM ZIMAGE
            WHERE ZDOWNLOADED = 1
              AND instr(COALESCE(ZURL, ''), ?1) = 0
            ORDER BY Z_PK
            "#,
        )
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PipelineError::record_store("query", e))?;

        debug!(count = rows.len(), "Loaded pending records");

        Ok(rows
            .into_iter()
            .map(|(id, cache_file, url)| PendingRecord {
                id: RecordId(id),
                cache_file: cache_file.unwrap_or_default(),
                url: url.unwrap_or_default(),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn update_reference(&self, id: RecordId, url: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE ZIMAGE SET ZURL = ?1 WHERE Z_PK = ?2")
            .bind(url)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::record_store("update", e))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn library_with_rows(rows: &[(i64, Option<&str>, Option<&str>, i64)]) -> (TempDir, SqliteRecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gifwit.storedata");

        let seed = SqlitePool::connect_with(
            SqliteConnectOptions::new().filename(&path).create_if_missing(true),
        )
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE ZIMAGE (Z_PK INTEGER PRIMARY KEY, ZCACHE_FILE VARCHAR, ZURL VARCHAR, ZDOWNLOADED INTEGER)",
        )
        .execute(&seed)
        .await
        .unwrap();
        for (id, file, url, downloaded) in rows {
            sqlx::query("INSERT INTO ZIMAGE (Z_PK, ZCACHE_FILE, ZURL, ZDOWNLOADED) VALUES (?1, ?2, ?3, ?4)")
                .bind(*id)
                .bind(*file)
                .bind(*url)
                .bind(*downloaded)
                .execute(&seed)
                .await
                .unwrap();
        }
        seed.close().await;

        let store = SqliteRecordStore::open(&path).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_pending_records_filters_and_orders() {
        let (_dir, store) = library_with_rows(&[
            (3, Some("c.gif"), Some("http://giphy.com/c.gif"), 1),
            (1, Some("a.gif"), None, 1),
            (2, Some("b.gif"), Some("https://s3-us-west-2.amazonaws.com/durablewit/abc.gif"), 1),
            (4, Some("d.gif"), Some(""), 0),
            (5, None, Some("http://imgur.com/e.gif"), 1),
        ])
        .await;

        let pending = store.pending_records("durablewit").await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 3, 5]);

        assert_eq!(pending[0].url, "");
        assert_eq!(pending[1].cache_file, "c.gif");
        assert_eq!(pending[2].cache_file, "");
    }

    #[tokio::test]
    async fn test_update_reference_reports_rows_affected() {
        let (_dir, store) = library_with_rows(&[(1, Some("a.gif"), None, 1)]).await;

        let changed = store
            .update_reference(RecordId(1), "https://example.com/durablewit/x.gif")
            .await
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(
            store.reference(RecordId(1)).await.unwrap().as_deref(),
            Some("https://example.com/durablewit/x.gif")
        );

        let missing = store.update_reference(RecordId(99), "irrelevant").await.unwrap();
        assert_eq!(missing, 0);
        assert_eq!(store.reference(RecordId(99)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_missing_database_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteRecordStore::open(&dir.path().join("nope.storedata")).await;
        assert!(matches!(result, Err(PipelineError::OpenStore { .. })));
    }
}
