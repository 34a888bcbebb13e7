//! End-to-end workflows: manager, live arrays, refresh, and bulk save.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use record_cache_core::{ModelName, RecordArrayManager, StoreError};

use crate::helpers::{BackedIdentity, BackendStore, TrackedRecord};

#[tokio::test]
async fn live_array_follows_the_record_lifecycle() -> Result<()> {
    let store = BackendStore::new();
    let manager = RecordArrayManager::new(store.clone());
    let model = ModelName::new("post");

    let first = BackedIdentity::new(TrackedRecord::new());
    let second = BackedIdentity::new(TrackedRecord::new());
    manager.record_added(&model, Arc::clone(&first));
    manager.record_added(&model, Arc::clone(&second));

    let array = manager.live_array_for(&model);
    assert_eq!(array.len(), 2);
    assert!(array.record_at(0).is_some());
    assert!(array.record_at(2).is_none());

    manager.record_removed(&model, &first);
    assert_eq!(array.len(), 1);

    // The live view is immutable to consumers.
    let error = array.replace().unwrap_err();
    assert!(matches!(error, StoreError::ImmutableRecordArray { .. }));

    Ok(())
}

#[tokio::test]
async fn coalesced_refresh_issues_a_single_backend_fetch() -> Result<()> {
    let store = BackendStore::new();
    let manager = RecordArrayManager::new(store.clone());
    let array = manager.live_array_for(&ModelName::new("post"));

    let first = array.update()?;
    let second = array.update()?;
    assert_eq!(store.fetches(), 1);
    assert!(array.is_updating());

    store.settle_all(json!({ "records": ["a", "b"] }));

    assert_eq!(first.wait().await?, json!({ "records": ["a", "b"] }));
    assert_eq!(second.wait().await?, json!({ "records": ["a", "b"] }));
    assert!(!array.is_updating());
    assert!(array.is_loaded());

    // A later refresh starts a new flight.
    let retry = array.update()?;
    assert_eq!(store.fetches(), 2);
    store.settle_all(json!({ "records": [] }));
    retry.wait().await?;

    Ok(())
}

#[tokio::test]
async fn failed_refresh_leaves_the_array_usable() -> Result<()> {
    let store = BackendStore::new();
    let manager = RecordArrayManager::new(store.clone());
    let array = manager.live_array_for(&ModelName::new("post"));

    let update = array.update()?;
    store.fail_all(StoreError::FetchFailed("backend unavailable".to_string()));

    assert!(update.wait().await.is_err());
    assert!(!array.is_updating());

    let retry = array.update()?;
    assert_eq!(store.fetches(), 2);
    store.settle_all(json!(null));
    retry.wait().await?;
    assert!(array.is_loaded());

    Ok(())
}

#[tokio::test]
async fn bulk_save_persists_every_record_once() -> Result<()> {
    let store = BackendStore::new();
    let manager = RecordArrayManager::new(store.clone());
    let model = ModelName::new("post");

    let record1 = TrackedRecord::new();
    let record2 = TrackedRecord::new();
    manager.record_added(&model, BackedIdentity::new(Arc::clone(&record1)));
    manager.record_added(&model, BackedIdentity::new(Arc::clone(&record2)));

    let array = manager.live_array_for(&model);
    let saved = array.save().wait().await?;

    assert!(Arc::ptr_eq(&saved, &array));
    assert_eq!(record1.saves(), 1);
    assert_eq!(record2.saves(), 1);

    Ok(())
}

#[tokio::test]
async fn teardown_stops_further_refreshes() -> Result<()> {
    let store = BackendStore::new();
    let manager = RecordArrayManager::new(store.clone());
    let array = manager.live_array_for(&ModelName::new("post"));

    manager.teardown();

    assert_eq!(manager.array_count(), 0);
    assert!(matches!(
        array.update().unwrap_err(),
        StoreError::StoreDetached { .. }
    ));
    assert_eq!(store.fetches(), 0);

    Ok(())
}
