//! Live record array lifecycle management.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::ModelName;
use crate::record::InternalModel;
use crate::record_array::{RecordArray, RecordArrayOptions};
use crate::store::Store;

/// Owns the live "all records of this type" arrays for one store.
///
/// Arrays are created on first request and mutated as the store creates or
/// deletes records. Tearing the manager down detaches every array so stale
/// consumers cannot trigger further fetches.
pub struct RecordArrayManager {
    store: Arc<dyn Store>,
    live_arrays: RwLock<HashMap<ModelName, Arc<RecordArray>>>,
}

impl RecordArrayManager {
    /// Creates a manager fronting `store`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            live_arrays: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the live array for `model`, creating it on first request.
    pub fn live_array_for(&self, model: &ModelName) -> Arc<RecordArray> {
        if let Some(array) = self.live_arrays.read().get(model) {
            return Arc::clone(array);
        }
        let mut live_arrays = self.live_arrays.write();
        Arc::clone(live_arrays.entry(model.clone()).or_insert_with(|| {
            tracing::debug!(model = %model, "creating live record array");
            RecordArray::new(
                model.clone(),
                RecordArrayOptions {
                    store: Some(Arc::clone(&self.store)),
                    ..Default::default()
                },
            )
        }))
    }

    /// Reflects a newly created record into the live array for `model`.
    pub fn record_added(&self, model: &ModelName, identity: Arc<dyn InternalModel>) {
        self.live_array_for(model).add_internal_model(identity);
    }

    /// Reflects a deleted record; no-op when no live array exists.
    pub fn record_removed(&self, model: &ModelName, identity: &Arc<dyn InternalModel>) {
        if let Some(array) = self.live_arrays.read().get(model) {
            array.remove_internal_model(identity);
        }
    }

    pub fn has_live_array(&self, model: &ModelName) -> bool {
        self.live_arrays.read().contains_key(model)
    }

    pub fn array_count(&self) -> usize {
        self.live_arrays.read().len()
    }

    /// Detaches every live array and forgets them.
    pub fn teardown(&self) {
        let mut live_arrays = self.live_arrays.write();
        for array in live_arrays.values() {
            array.detach();
        }
        live_arrays.clear();
        tracing::debug!("record array manager torn down");
    }
}
