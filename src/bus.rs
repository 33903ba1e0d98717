use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

/// A draft-reset request fanned out to every open decision view. A missing
/// task id addresses all of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResetSignal {
    pub task_id: Option<String>,
    pub issued_at: i64,
}

impl ResetSignal {
    pub fn all() -> Self {
        Self {
            task_id: None,
            issued_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn for_task(task_id: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            issued_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn targets(&self, task_id: &str) -> bool {
        match &self.task_id {
            Some(id) => id == task_id,
            None => true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResetBusMetrics {
    pub sent: u64,
    pub errors: u64,
}

/// Broadcast fan-out for reset signals. Subscribers outlive individual
/// publishes; a publish with no live subscriber counts as an error.
pub struct ResetBus {
    reset_tx: broadcast::Sender<ResetSignal>,
    sent: AtomicU64,
    errors: AtomicU64,
}

impl ResetBus {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (reset_tx, _) = broadcast::channel(capacity);
        Self {
            reset_tx,
            sent: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResetSignal> {
        self.reset_tx.subscribe()
    }

    pub fn publish(
        &self,
        signal: ResetSignal,
    ) -> Result<usize, broadcast::error::SendError<ResetSignal>> {
        match self.reset_tx.send(signal) {
            Ok(count) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                Ok(count)
            }
            Err(err) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    pub fn metrics(&self) -> ResetBusMetrics {
        ResetBusMetrics {
            sent: self.sent.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResetBus {
    fn default() -> Self {
        Self::new(16)
    }
}
