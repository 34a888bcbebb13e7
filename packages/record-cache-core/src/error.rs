//! Record cache error types.

use thiserror::Error;

/// Errors surfaced by record arrays and their store collaborators.
///
/// Cloneable so settled outcomes can be republished to every waiter on a
/// coalesced update.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Attempt to splice a server-derived record array
    #[error("The result of a server query (for all '{model}' types) is immutable. To modify contents, use to_records()")]
    ImmutableRecordArray { model: String },

    /// Update requested on an array with no store reference
    #[error("Record array for '{model}' is not attached to a store")]
    StoreDetached { model: String },

    /// Store dropped the fetch before it settled
    #[error("Fetch for '{model}' was aborted before it settled")]
    FetchAborted { model: String },

    /// Record dropped the save before it settled
    #[error("Save was aborted before it settled")]
    SaveAborted,

    /// Store-side fetch failure
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// Record-side save failure
    #[error("Save failed: {0}")]
    SaveFailed(String),
}
