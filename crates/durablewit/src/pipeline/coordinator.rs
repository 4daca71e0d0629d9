//! Closing a queue that several workers write into
//!
//! The coordinator keeps the boundary's original sender and hands clones to
//! the workers it spawns. Only after every worker has returned does it drop
//! its own sender, so the downstream consumer sees end-of-stream exactly once
//! and never before the last producer is done.

use crate::error::{PipelineError, Result};
use std::any::Any;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::debug;

pub struct ShutdownCoordinator<T> {
    stage: &'static str,
    workers: JoinSet<()>,
    sender: mpsc::Sender<T>,
}

impl<T: Send + 'static> ShutdownCoordinator<T> {
    pub fn new(stage: &'static str, sender: mpsc::Sender<T>) -> Self {
        Self {
            stage,
            workers: JoinSet::new(),
            sender,
        }
    }

    /// Sender for a new producer
    pub fn sender(&self) -> mpsc::Sender<T> {
        self.sender.clone()
    }

    pub fn spawn<F>(&mut self, worker: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.workers.spawn(worker);
    }

    /// Wait for every worker, then close the queue.
    ///
    /// A panicking worker ends the wait immediately: the remaining workers
    /// are aborted, which also releases their senders.
    pub async fn wait_and_close(mut self) -> Result<()> {
        let total = self.workers.len();

        while let Some(joined) = self.workers.join_next().await {
            if let Err(err) = joined {
                return Err(worker_failure(self.stage, err));
            }
        }

        drop(self.sender);
        debug!(stage = self.stage, workers = total, "All workers finished, queue closed");
        Ok(())
    }
}

fn worker_failure(stage: &'static str, err: JoinError) -> PipelineError {
    let message = if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "worker was cancelled".to_string()
    };
    PipelineError::WorkerPanicked { stage, message }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
