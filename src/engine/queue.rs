//! Shared task queue for the worker pool.
//!
//! A bounded FIFO channel with one producer handle and a consumer handle
//! that any number of workers share. Closing the queue (dropping the
//! producer) is the shutdown signal: every blocked `pop` returns `None`
//! once the backlog is drained, so no consumer-counting sentinels are
//! needed and no worker can block forever on an empty queue.

use crate::types::ScanTask;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Create a bounded task queue.
pub(crate) fn task_channel(capacity: usize) -> (TaskSender, TaskReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        TaskSender { tx },
        TaskReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer handle for the task queue.
pub(crate) struct TaskSender {
    tx: mpsc::Sender<ScanTask>,
}

impl TaskSender {
    /// Enqueue one task, waiting while the queue is full.
    ///
    /// An error means every consumer has already exited; the task is handed
    /// back to the caller.
    pub(crate) async fn push(&self, task: ScanTask) -> Result<(), ScanTask> {
        self.tx.send(task).await.map_err(|e| e.0)
    }
}

/// Shared consumer handle; clones compete for tasks.
///
/// Each task is delivered to exactly one consumer, in FIFO order.
#[derive(Clone)]
pub(crate) struct TaskReceiver {
    rx: Arc<Mutex<mpsc::Receiver<ScanTask>>>,
}

impl TaskReceiver {
    /// Pop the next task, blocking until one is available.
    ///
    /// Returns `None` once the queue has been closed and fully drained.
    pub(crate) async fn pop(&self) -> Option<ScanTask> {
        self.rx.lock().await.recv().await
    }
}
