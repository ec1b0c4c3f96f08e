//! Process-local document store used when no remote backend is configured, and by tests.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::dao::{
    document_store::{CollectionPath, DocumentPath, DocumentStore, FieldFilter},
    storage::{StorageError, StorageResult},
};

#[derive(Debug, Error)]
#[error("in-memory store is offline")]
pub struct MemoryStoreOffline;

/// Documents grouped per collection, kept in first-insertion order.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<DashMap<CollectionPath, IndexMap<String, Value>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails until brought back online.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of documents stored in a collection.
    pub fn len(&self, path: &CollectionPath) -> usize {
        self.collections.get(path).map(|docs| docs.len()).unwrap_or(0)
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                "memory store offline".into(),
                MemoryStoreOffline,
            ))
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get_document(&self, path: DocumentPath) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store
                .collections
                .get(path.collection())
                .and_then(|docs| docs.get(path.id()).cloned()))
        })
    }

    fn set_document(&self, path: DocumentPath, data: Value) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            store
                .collections
                .entry(path.collection().clone())
                .or_default()
                .insert(path.id().to_string(), data);
            Ok(())
        })
    }

    fn query_collection(
        &self,
        path: CollectionPath,
        filter: FieldFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<Value>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store
                .collections
                .get(&path)
                .map(|docs| {
                    docs.values()
                        .filter(|doc| filter.matches(doc))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scores() -> CollectionPath {
        CollectionPath::new(["artifacts", "app", "public", "data", "highScores"])
    }

    #[tokio::test]
    async fn set_then_get_returns_document() {
        let store = MemoryDocumentStore::new();
        let path = scores().document("u1_track");
        assert_eq!(store.get_document(path.clone()).await.unwrap(), None);

        store
            .set_document(path.clone(), json!({"score": 1}))
            .await
            .unwrap();
        assert_eq!(
            store.get_document(path).await.unwrap(),
            Some(json!({"score": 1}))
        );
    }

    #[tokio::test]
    async fn overwrite_keeps_single_document() {
        let store = MemoryDocumentStore::new();
        let path = scores().document("u1_track");
        store.set_document(path.clone(), json!({"score": 1})).await.unwrap();
        store.set_document(path.clone(), json!({"score": 2})).await.unwrap();

        assert_eq!(store.len(&scores()), 1);
        assert_eq!(
            store.get_document(path).await.unwrap(),
            Some(json!({"score": 2}))
        );
    }

    #[tokio::test]
    async fn query_filters_and_keeps_insertion_order() {
        let store = MemoryDocumentStore::new();
        for (id, music) in [("a", "x"), ("b", "y"), ("c", "x")] {
            store
                .set_document(scores().document(id), json!({"musicId": music, "id": id}))
                .await
                .unwrap();
        }

        let found = store
            .query_collection(scores(), FieldFilter::equals("musicId", "x"))
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|doc| doc["id"].clone()).collect();
        assert_eq!(ids, [json!("a"), json!("c")]);
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryDocumentStore::new();
        store.set_offline(true);
        assert!(store.health_check().await.is_err());
        assert!(store.get_document(scores().document("a")).await.is_err());
        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
    }
}
