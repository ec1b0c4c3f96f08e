use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoDocumentRecord, collection_filter, doc_id},
};
use crate::dao::{
    document_store::{CollectionPath, DocumentPath, DocumentStore, FieldFilter},
    storage::StorageResult,
};

const DOCUMENT_COLLECTION_NAME: &str = "documents";

#[derive(Clone)]
pub struct MongoDocumentStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoDocumentStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            database: RwLock::new(database),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let index = IndexModel::builder()
            .keys(doc! {"collection": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("document_collection_idx".to_owned()))
                    .build(),
            )
            .build();

        self.collection()
            .await
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: DOCUMENT_COLLECTION_NAME,
                index: "collection",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoDocumentRecord> {
        let guard = self.inner.database.read().await;
        guard.collection::<MongoDocumentRecord>(DOCUMENT_COLLECTION_NAME)
    }

    async fn find_document(&self, path: DocumentPath) -> MongoResult<Option<Value>> {
        let record = self
            .collection()
            .await
            .find_one(doc_id(&path))
            .await
            .map_err(|source| MongoDaoError::LoadDocument {
                path: path.to_string(),
                source,
            })?;
        Ok(record.map(|record| record.data))
    }

    async fn save_document(&self, path: DocumentPath, data: Value) -> MongoResult<()> {
        let record = MongoDocumentRecord::new(&path, data);
        self.collection()
            .await
            .replace_one(doc_id(&path), &record)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveDocument {
                path: path.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn find_matching(
        &self,
        path: CollectionPath,
        filter: FieldFilter,
    ) -> MongoResult<Vec<Value>> {
        let query_error = |source| MongoDaoError::QueryCollection {
            collection: path.to_string(),
            source,
        };

        let records: Vec<MongoDocumentRecord> = self
            .collection()
            .await
            .find(collection_filter(&path, &filter))
            .await
            .map_err(query_error)?
            .try_collect()
            .await
            .map_err(query_error)?;

        Ok(records.into_iter().map(|record| record.data).collect())
    }
}

impl DocumentStore for MongoDocumentStore {
    fn get_document(&self, path: DocumentPath) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        Box::pin(async move { store.find_document(path).await.map_err(Into::into) })
    }

    fn set_document(&self, path: DocumentPath, data: Value) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_document(path, data).await.map_err(Into::into) })
    }

    fn query_collection(
        &self,
        path: CollectionPath,
        filter: FieldFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<Value>>> {
        let store = self.clone();
        Box::pin(async move { store.find_matching(path, filter).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
