use super::item::{FingerprintedItem, PendingItem};
use super::queue::StageReceiver;
use super::stats::{Event, PipelineStats};
use durablewit_common::Fingerprint;
use std::path::{Component, Path};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One fingerprint worker. Runs until its input is drained or the upload
/// stage stops accepting items.
pub(crate) async fn worker(
    worker: usize,
    library_dir: Arc<Path>,
    input: StageReceiver<PendingItem>,
    output: mpsc::Sender<FingerprintedItem>,
    stats: Arc<PipelineStats>,
) {
    while let Some(item) = input.recv().await {
        let Some(item) = fingerprint_item(&library_dir, item, &stats).await else {
            continue;
        };

        if output.send(item).await.is_err() {
            debug!(worker, "Upload stage closed, stopping");
            break;
        }
    }

    debug!(worker, "Fingerprint worker finished");
}

/// Hash the record's cached file; `None` drops the record.
async fn fingerprint_item(library_dir: &Path, item: PendingItem, stats: &PipelineStats) -> Option<FingerprintedItem> {
    let record_id = item.record_id();

    if item.local_relative_path().is_empty() {
        info!(%record_id, "Record has no cached file, skipping");
        stats.record(Event::Missing);
        return None;
    }

    if !stays_inside(Path::new(item.local_relative_path())) {
        warn!(
            %record_id,
            cache_file = item.local_relative_path(),
            "Cached file path leaves the library directory, skipping"
        );
        stats.record(Event::Failed);
        return None;
    }

    let path = library_dir.join(item.local_relative_path());

    match Fingerprint::from_file(&path).await {
        Ok(fingerprint) => {
            debug!(%record_id, %fingerprint, path = %path.display(), "Fingerprinted");
            stats.record(Event::Fingerprinted);
            Some(item.fingerprinted(fingerprint, path))
        },
        Err(err) if err.is_not_found() => {
            info!(%record_id, path = %path.display(), "Cached file missing, skipping");
            stats.record(Event::Missing);
            None
        },
        Err(err) => {
            warn!(%record_id, path = %path.display(), error = %err, "Failed to read cached file, skipping");
            stats.record(Event::Failed);
            None
        },
    }
}

/// A cache path may only name something below the library directory: no
/// root, drive prefix or `..` component.
fn stays_inside(relative: &Path) -> bool {
    relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::pipeline::item::WorkItem;
    use crate::store::{PendingRecord, RecordId};
    use tempfile::TempDir;

    fn pending(id: i64, cache_file: &str) -> PendingItem {
        WorkItem::new(PendingRecord {
            id: RecordId(id),
            cache_file: cache_file.to_string(),
            url: String::new(),
        })
    }

    #[tokio::test]
    async fn test_existing_file_is_fingerprinted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.gif"), b"hello world").unwrap();
        let stats = PipelineStats::default();

        let item = fingerprint_item(dir.path(), pending(1, "a.gif"), &stats)
            .await
            .unwrap();

        assert_eq!(
            item.fingerprint().as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(item.resolved_path(), dir.path().join("a.gif"));
        assert_eq!(stats.summary().fingerprinted, 1);
    }

    #[tokio::test]
    async fn test_missing_and_empty_paths_are_skipped() {
        let dir = TempDir::new().unwrap();
        let stats = PipelineStats::default();

        assert!(fingerprint_item(dir.path(), pending(1, "gone.gif"), &stats).await.is_none());
        assert!(fingerprint_item(dir.path(), pending(2, ""), &stats).await.is_none());

        let summary = stats.summary();
        assert_eq!(summary.missing, 2);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_unreadable_path_counts_as_failed() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("folder.gif")).unwrap();
        let stats = PipelineStats::default();

        assert!(fingerprint_item(dir.path(), pending(1, "folder.gif"), &stats).await.is_none());
        assert_eq!(stats.summary().failed, 1);
    }

    #[tokio::test]
    async fn test_paths_outside_library_are_rejected() {
        let root = TempDir::new().unwrap();
        let library = root.path().join("library");
        std::fs::create_dir(&library).unwrap();
        std::fs::write(root.path().join("secret.gif"), b"not yours").unwrap();

        let elsewhere = TempDir::new().unwrap();
        let absolute = elsewhere.path().join("secret.gif");
        std::fs::write(&absolute, b"not yours either").unwrap();

        let stats = PipelineStats::default();
        let absolute = absolute.to_str().unwrap();
        assert!(fingerprint_item(&library, pending(1, absolute), &stats).await.is_none());
        assert!(fingerprint_item(&library, pending(2, "../secret.gif"), &stats).await.is_none());
        assert!(fingerprint_item(&library, pending(3, "sub/../../secret.gif"), &stats).await.is_none());

        let summary = stats.summary();
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.fingerprinted, 0);
    }

    #[tokio::test]
    async fn test_nested_relative_path_is_allowed() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("cache")).unwrap();
        std::fs::write(dir.path().join("cache").join("a.gif"), b"a").unwrap();
        let stats = PipelineStats::default();

        let item = fingerprint_item(dir.path(), pending(1, "./cache/a.gif"), &stats).await.unwrap();
        assert!(item.resolved_path().starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_worker_forwards_only_hashable_records() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.gif"), b"a").unwrap();
        std::fs::write(dir.path().join("c.gif"), b"c").unwrap();

        let (in_tx, in_rx) = crate::pipeline::queue::stage_queue(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let stats = Arc::new(PipelineStats::default());

        let handle = tokio::spawn(worker(0, Arc::from(dir.path()), in_rx, out_tx, Arc::clone(&stats)));
        for (id, file) in [(1, "a.gif"), (2, "b.gif"), (3, "c.gif")] {
            in_tx.send(pending(id, file)).await.unwrap();
        }
        drop(in_tx);
        handle.await.unwrap();

        let mut ids = Vec::new();
        while let Some(item) = out_rx.recv().await {
            ids.push(item.record_id());
        }
        assert_eq!(ids, vec![RecordId(1), RecordId(3)]);
        assert_eq!(stats.summary().missing, 1);
    }
}
