//! Client-side record cache: live record arrays over an asynchronous store.
//!
//! A [`RecordArray`] presents an ordered, read-only view of the backing
//! identities a store owns for one model type, coalesces forced refreshes
//! onto a single in-flight fetch, and fans bulk saves out across every
//! record. [`RecordArrayManager`] covers the lifecycle: one live array per
//! model type, kept in step as records are created and deleted, detached
//! when the store tears down.

pub mod error;
pub mod manager;
pub mod model;
pub mod record;
pub mod record_array;
pub mod store;

pub use error::StoreError;
pub use manager::RecordArrayManager;
pub use model::{FindOptions, ModelName};
pub use record::{InternalModel, Record, SaveHandle, SaveSender};
pub use record_array::{RecordArray, RecordArrayOptions, SaveAll, UpdateHandle};
pub use store::{FetchHandle, FetchSender, Store};

/// Result type for record cache operations.
pub type Result<T> = std::result::Result<T, StoreError>;
