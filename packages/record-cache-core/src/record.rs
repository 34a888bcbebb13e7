//! Record and backing-identity contracts plus the pending save handle.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::StoreError;
use crate::Result;

/// Sender half of a pending save, held by the record while it persists.
pub type SaveSender = oneshot::Sender<Result<Arc<dyn Record>>>;

/// Materialized record handle.
pub trait Record: Send + Sync {
    /// Persists the record; must issue the save before returning.
    fn save(&self) -> SaveHandle;
}

impl std::fmt::Debug for dyn Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Record")
    }
}

/// Backing identity owned by the store and referenced by record arrays.
///
/// Identity is pointer identity: two `Arc<dyn InternalModel>` values refer
/// to the same backing identity iff they point at the same allocation.
pub trait InternalModel: Send + Sync {
    /// Materializes the record this identity backs.
    fn record(&self) -> Arc<dyn Record>;
}

/// Pending result of a record save, resolving with the saved record.
pub struct SaveHandle {
    rx: oneshot::Receiver<Result<Arc<dyn Record>>>,
}

impl SaveHandle {
    /// Creates a connected sender/handle pair.
    pub fn channel() -> (SaveSender, SaveHandle) {
        let (tx, rx) = oneshot::channel();
        (tx, SaveHandle { rx })
    }

    /// Handle that settled at creation, for saves that complete synchronously.
    pub fn settled(outcome: Result<Arc<dyn Record>>) -> SaveHandle {
        let (tx, handle) = SaveHandle::channel();
        let _ = tx.send(outcome);
        handle
    }

    /// Waits for the record to settle the save.
    pub async fn wait(self) -> Result<Arc<dyn Record>> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(StoreError::SaveAborted),
        }
    }
}
