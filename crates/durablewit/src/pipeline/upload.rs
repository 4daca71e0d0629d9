use super::item::{FingerprintedItem, LocatedItem, Placement};
use super::queue::StageReceiver;
use super::stats::{Event, PipelineStats};
use crate::media::{FormatSniffer, ImageFormat, FALLBACK_CONTENT_TYPE, SNIFF_LEN};
use crate::storage::{ObjectKey, ObjectStore, PutOptions};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One upload worker. Runs until its input is drained or the writer stops
/// accepting items.
pub(crate) async fn worker(
    worker: usize,
    objects: Arc<dyn ObjectStore>,
    sniffer: Arc<dyn FormatSniffer>,
    input: StageReceiver<FingerprintedItem>,
    output: mpsc::Sender<LocatedItem>,
    stats: Arc<PipelineStats>,
) {
    while let Some(item) = input.recv().await {
        let record_id = item.record_id();

        let located = match place(objects.as_ref(), sniffer.as_ref(), item).await {
            Ok(located) => located,
            Err(err) => {
                let error = format!("{err:#}");
                warn!(worker, %record_id, %error, "Failed to store object, skipping record");
                stats.record(Event::Failed);
                continue;
            },
        };

        stats.record(match located.placement() {
            Placement::Reused => Event::Reused,
            Placement::Uploaded => Event::Uploaded,
        });

        if output.send(located).await.is_err() {
            debug!(worker, "Writer closed, stopping");
            break;
        }
    }

    debug!(worker, "Upload worker finished");
}

/// Make sure the item's content is stored and work out where it lives.
///
/// Existing objects are never rewritten. Two workers racing on the same new
/// key may both upload; the bytes and therefore the object are the same.
async fn place(objects: &dyn ObjectStore, sniffer: &dyn FormatSniffer, item: FingerprintedItem) -> Result<LocatedItem> {
    let head = read_head(item.resolved_path())
        .await
        .with_context(|| format!("Failed to read {}", item.resolved_path().display()))?;

    let format = sniffer.detect(&head);
    if format.is_none() {
        debug!(record_id = %item.record_id(), "Unrecognised image format, storing without extension");
    }
    let key = ObjectKey::for_content(item.fingerprint(), format);

    if objects.exists(&key).await? {
        let location = objects.location_for(&key);
        debug!(record_id = %item.record_id(), %key, "Content already stored");
        return Ok(item.located(key, location, Placement::Reused));
    }

    let options = PutOptions {
        content_type: format.map_or(FALLBACK_CONTENT_TYPE, ImageFormat::mime_type),
        public_read: true,
    };
    let location = objects.put_object(&key, item.resolved_path(), options).await?;
    debug!(record_id = %item.record_id(), %key, %location, "Uploaded");

    Ok(item.located(key, location, Placement::Uploaded))
}

/// Up to `SNIFF_LEN` leading bytes of the file
async fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut head).await?;
    Ok(head)
}
