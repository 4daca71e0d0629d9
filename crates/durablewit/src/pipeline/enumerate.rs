use super::item::{PendingItem, WorkItem};
use super::stats::{Event, PipelineStats};
use crate::error::{PipelineError, Result};
use crate::store::RecordStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Feed every pending record into the fingerprint queue, in id order.
///
/// The whole pending set is read before the first item is sent. Returning
/// drops the only sender, which is how the fingerprint stage learns there is
/// nothing more to come.
pub(crate) async fn run(
    records: Arc<dyn RecordStore>,
    exclude: String,
    queue: mpsc::Sender<PendingItem>,
    stats: Arc<PipelineStats>,
) -> Result<()> {
    let pending = records.pending_records(&exclude).await?;
    info!(count = pending.len(), exclude = %exclude, "Found records pending migration");

    for record in pending {
        debug!(record_id = %record.id, cache_file = %record.cache_file, "Queueing record");
        stats.record(Event::Enumerated);
        queue
            .send(WorkItem::new(record))
            .await
            .map_err(|_| PipelineError::StageClosed { stage: "fingerprint" })?;
    }

    debug!("Enumeration finished");
    Ok(())
}
