use super::item::LocatedItem;
use super::stats::{Event, PipelineStats};
use crate::error::{PipelineError, Result};
use crate::store::RecordStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The single writer: point each located record at its new location.
///
/// Updates are applied one at a time in arrival order. The first failed
/// update ends the stage, and with it the run; nothing after it is written.
pub(crate) async fn run(
    records: Arc<dyn RecordStore>,
    mut input: mpsc::Receiver<LocatedItem>,
    stats: Arc<PipelineStats>,
) -> Result<()> {
    while let Some(item) = input.recv().await {
        let record_id = item.record_id();

        let rows = records
            .update_reference(record_id, item.new_location())
            .await
            .map_err(|source| PipelineError::Persist {
                record_id,
                source: Box::new(source),
            })?;

        if rows == 0 {
            warn!(%record_id, "Record vanished before its location could be saved");
            stats.record(Event::Stale);
            continue;
        }

        info!(
            %record_id,
            cache_file = item.local_relative_path(),
            from = item.original_url(),
            to = item.new_location(),
            placement = %item.placement(),
            "Record migrated"
        );
        stats.record(Event::Persisted);
    }

    debug!("Writer finished");
    Ok(())
}
