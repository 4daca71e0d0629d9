//! Bounded queues between stages
//!
//! A full queue suspends the producer, so no stage can run ahead of the one
//! after it by more than the queue's capacity. Pooled stages share a single
//! receiver; whichever worker is idle takes the next item.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Receiving end shared by every worker of a pool
#[derive(Debug)]
pub struct StageReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for StageReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> StageReceiver<T> {
    /// Next item, or `None` once every sender is gone and the queue is drained
    pub async fn recv(&self) -> Option<T> {
        self.inner.lock().await.recv().await
    }
}

pub fn stage_queue<T>(capacity: usize) -> (mpsc::Sender<T>, StageReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        tx,
        StageReceiver {
            inner: Arc::new(Mutex::new(rx)),
        },
    )
}
