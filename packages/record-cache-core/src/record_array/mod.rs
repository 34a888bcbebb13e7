//! Live record arrays: ordered, read-only views over backing identities.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::StoreError;
use crate::model::{FindOptions, ModelName};
use crate::record::{InternalModel, Record, SaveHandle};
use crate::store::Store;
use crate::Result;

/// Creation-time state for a record array.
///
/// There is deliberately no updating field: the updating state is derived
/// from the in-flight fetch slot, so a freshly created array is always
/// idle.
#[derive(Default)]
pub struct RecordArrayOptions {
    /// Backing store reference; `None` builds a detached array
    pub store: Option<Arc<dyn Store>>,
    /// Initial sequence of backing identities; `None` means not yet supplied
    pub content: Option<Vec<Arc<dyn InternalModel>>>,
    /// Seed the loaded flag, for arrays materialized from already-cached data
    pub loaded: bool,
}

/// Ordered collection of backing identities for one model type.
///
/// Consumers read records through [`RecordArray::record_at`] and
/// [`RecordArray::to_records`]; the sequence itself is only mutated by the
/// store through [`RecordArray::add_internal_model`] and
/// [`RecordArray::remove_internal_model`]. Forced refreshes coalesce: any
/// number of [`RecordArray::update`] calls during one in-flight fetch share
/// a single settlement.
pub struct RecordArray {
    model: ModelName,
    store: RwLock<Option<Arc<dyn Store>>>,
    content: RwLock<Option<Vec<Arc<dyn InternalModel>>>>,
    loaded: AtomicBool,
    /// In-flight update slot; `Some` iff a fetch is pending
    flight: Mutex<Option<UpdateHandle>>,
}

impl std::fmt::Debug for RecordArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordArray")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl RecordArray {
    /// Creates a record array for `model` with the given initial state.
    pub fn new(model: ModelName, options: RecordArrayOptions) -> Arc<Self> {
        Arc::new(Self {
            model,
            store: RwLock::new(options.store),
            content: RwLock::new(options.content),
            loaded: AtomicBool::new(options.loaded),
            flight: Mutex::new(None),
        })
    }

    /// The model type this array holds records of.
    pub fn model(&self) -> &ModelName {
        &self.model
    }

    /// The backing store reference, if the array is attached.
    pub fn store(&self) -> Option<Arc<dyn Store>> {
        self.store.read().clone()
    }

    /// Snapshot of the backing-identity sequence, `None` if never supplied.
    pub fn content(&self) -> Option<Vec<Arc<dyn InternalModel>>> {
        self.content.read().clone()
    }

    /// True once a refresh has completed (or the array was seeded loaded).
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// True while a forced refresh is in flight.
    pub fn is_updating(&self) -> bool {
        self.flight.lock().is_some()
    }

    pub fn len(&self) -> usize {
        self.content.read().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materializes the record at `index`, or `None` when out of range.
    pub fn record_at(&self, index: usize) -> Option<Arc<dyn Record>> {
        let content = self.content.read();
        content.as_ref()?.get(index).map(|identity| identity.record())
    }

    /// Server-derived query results cannot be spliced; always fails.
    ///
    /// Consumers wanting a mutable sequence materialize one with
    /// [`RecordArray::to_records`] first.
    pub fn replace(&self) -> Result<()> {
        Err(StoreError::ImmutableRecordArray {
            model: self.model.as_str().to_string(),
        })
    }

    /// Materializes the whole view into a plain record sequence.
    pub fn to_records(&self) -> Vec<Arc<dyn Record>> {
        let content = self.content.read();
        content
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|identity| identity.record())
            .collect()
    }

    /// Appends `identity` unless it is already present.
    ///
    /// Duplicate adds are silent no-ops; the sequence never holds the same
    /// backing identity twice.
    pub fn add_internal_model(&self, identity: Arc<dyn InternalModel>) {
        let mut content = self.content.write();
        let entries = content.get_or_insert_with(Vec::new);
        if entries.iter().any(|existing| Arc::ptr_eq(existing, &identity)) {
            return;
        }
        entries.push(identity);
    }

    /// Removes `identity` if present; silent no-op otherwise.
    pub fn remove_internal_model(&self, identity: &Arc<dyn InternalModel>) {
        let mut content = self.content.write();
        if let Some(entries) = content.as_mut() {
            entries.retain(|existing| !Arc::ptr_eq(existing, identity));
        }
    }

    /// Forces a refresh from the backing store.
    ///
    /// If a refresh is already in flight the cached handle is returned and
    /// no second fetch is issued; every caller observes the same
    /// settlement. The fetch is issued before the updating state becomes
    /// observable, and the state returns to idle before the outcome is
    /// published, on success and failure alike.
    pub fn update(self: &Arc<Self>) -> Result<UpdateHandle> {
        let mut flight = self.flight.lock();
        if let Some(handle) = flight.as_ref() {
            tracing::debug!(model = %self.model, "update coalesced onto in-flight fetch");
            return Ok(handle.clone());
        }

        let store = self
            .store
            .read()
            .clone()
            .ok_or_else(|| StoreError::StoreDetached {
                model: self.model.as_str().to_string(),
            })?;

        let fetch = store.find_all(&self.model, FindOptions { reload: true });
        tracing::debug!(model = %self.model, "update issued");

        let (tx, rx) = watch::channel(None);
        let handle = UpdateHandle {
            model: self.model.clone(),
            rx,
        };
        *flight = Some(handle.clone());
        drop(flight);

        let array = Arc::downgrade(self);
        tokio::spawn(async move {
            let outcome = fetch.wait().await;
            if let Some(array) = array.upgrade() {
                array.settle_update(outcome.is_ok());
            }
            // Publish after the slot is cleared so waiters resume with the
            // array back in the idle state.
            let _ = tx.send(Some(outcome));
        });

        Ok(handle)
    }

    fn settle_update(&self, success: bool) {
        *self.flight.lock() = None;
        if success {
            self.loaded.store(true, Ordering::Release);
        }
        tracing::debug!(model = %self.model, success, "update settled");
    }

    /// Persists every record in the array.
    ///
    /// All saves are issued before this returns; the returned [`SaveAll`]
    /// completes once every one of them settles.
    pub fn save(self: &Arc<Self>) -> SaveAll {
        let pending: Vec<SaveHandle> = {
            let content = self.content.read();
            content
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|identity| identity.record().save())
                .collect()
        };
        tracing::debug!(model = %self.model, count = pending.len(), "save fan-out issued");
        SaveAll {
            array: Arc::clone(self),
            pending,
        }
    }

    /// Severs the store reference and drops the content sequence.
    ///
    /// Called by the manager when the store tears down; a detached array
    /// refuses further updates.
    pub fn detach(&self) {
        *self.store.write() = None;
        *self.content.write() = None;
        self.loaded.store(false, Ordering::Release);
        tracing::debug!(model = %self.model, "record array detached");
    }
}

/// Cloneable handle to the outcome of an in-flight update.
///
/// Clones share one underlying subscription: every holder observes the
/// identical settlement of the single fetch.
#[derive(Clone, Debug)]
pub struct UpdateHandle {
    model: ModelName,
    rx: watch::Receiver<Option<Result<Value>>>,
}

impl UpdateHandle {
    /// Waits for the in-flight fetch to settle.
    pub async fn wait(mut self) -> Result<Value> {
        loop {
            if let Some(outcome) = self.rx.borrow_and_update().clone() {
                return outcome;
            }
            if self.rx.changed().await.is_err() {
                return Err(StoreError::FetchAborted {
                    model: self.model.as_str().to_string(),
                });
            }
        }
    }
}

/// Joined result of a bulk save, yielding the array once every record
/// settles.
pub struct SaveAll {
    array: Arc<RecordArray>,
    pending: Vec<SaveHandle>,
}

impl SaveAll {
    /// Waits for every pending save; the first failure wins.
    pub async fn wait(self) -> Result<Arc<RecordArray>> {
        let mut first_error = None;
        for handle in self.pending {
            if let Err(error) = handle.wait().await {
                // Later saves still settle before the failure is reported.
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(self.array),
        }
    }
}
