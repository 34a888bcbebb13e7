//! Store collaborator contract and the pending fetch handle.

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::StoreError;
use crate::model::{FindOptions, ModelName};
use crate::Result;

/// Sender half of a pending fetch, held by the store while it resolves.
pub type FetchSender = oneshot::Sender<Result<Value>>;

/// Backing data-access contract consumed by record arrays.
///
/// `find_all` must issue the fetch before returning; the handle it hands
/// back only carries the eventual result.
pub trait Store: Send + Sync {
    /// Fetches every record of `model`, honoring `options.reload`.
    fn find_all(&self, model: &ModelName, options: FindOptions) -> FetchHandle;
}

/// Pending result of a store fetch.
#[derive(Debug)]
pub struct FetchHandle {
    model: ModelName,
    rx: oneshot::Receiver<Result<Value>>,
}

impl FetchHandle {
    /// Creates a connected sender/handle pair for `model`.
    pub fn channel(model: ModelName) -> (FetchSender, FetchHandle) {
        let (tx, rx) = oneshot::channel();
        (tx, FetchHandle { model, rx })
    }

    /// Waits for the store to settle the fetch.
    ///
    /// A sender dropped without publishing surfaces as
    /// [`StoreError::FetchAborted`].
    pub async fn wait(self) -> Result<Value> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(StoreError::FetchAborted {
                model: self.model.as_str().to_string(),
            }),
        }
    }
}
