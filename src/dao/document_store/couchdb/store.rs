use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value};
use tracing::debug;

use crate::dao::{
    document_store::{CollectionPath, DocumentPath, DocumentStore, FieldFilter},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchDocument, END_SUFFIX, collection_prefix, doc_id, is_direct_child,
    },
};

const ALL_DOCS: &str = "_all_docs";

#[derive(Clone)]
pub struct CouchDocumentStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchDocumentStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    /// URL of the database, or of one resource inside it. Segments are percent-encoded, so
    /// slash separated document ids stay a single path segment.
    fn url(&self, resource: Option<&str>) -> CouchResult<Url> {
        let invalid = || CouchDaoError::InvalidBaseUrl {
            url: self.base_url.to_string(),
        };

        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments.pop_if_empty().push(&self.database);
            if let Some(resource) = resource {
                segments.push(resource);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.url(None)?;

        let response = self
            .request(Method::GET, url.clone())
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .request(Method::PUT, url)
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn fetch_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, self.url(Some(doc_id))?)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, self.url(Some(doc_id))?)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    async fn list_documents(&self, prefix: &str) -> CouchResult<Vec<CouchDocument>> {
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, self.url(Some(ALL_DOCS))?)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if !is_direct_child(prefix, &row.id) {
                continue;
            }
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: row.id.clone(),
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }

    async fn replace_document(&self, path: DocumentPath, data: Value) -> CouchResult<()> {
        let id = doc_id(&path);
        let rev = self
            .fetch_document::<CouchDocument>(&id)
            .await?
            .and_then(|existing| existing.rev);
        let document = CouchDocument::new(&path, rev, data)?;
        self.put_document(&id, &document).await?;
        debug!(path = %path, "stored CouchDB document");
        Ok(())
    }
}

impl DocumentStore for CouchDocumentStore {
    fn get_document(&self, path: DocumentPath) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .fetch_document::<CouchDocument>(&doc_id(&path))
                .await?;
            Ok(maybe_doc.map(CouchDocument::into_body))
        })
    }

    fn set_document(&self, path: DocumentPath, data: Value) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.replace_document(path, data).await.map_err(Into::into) })
    }

    fn query_collection(
        &self,
        path: CollectionPath,
        filter: FieldFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<Value>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store.list_documents(&collection_prefix(&path)).await?;
            Ok(docs
                .into_iter()
                .map(CouchDocument::into_body)
                .filter(|body| filter.matches(body))
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.url(None)?;
            let path = url.to_string();

            let response = store
                .request(Method::GET, url)
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: path.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base_url: &str) -> CouchDocumentStore {
        CouchDocumentStore {
            client: Client::new(),
            base_url: Arc::from(base_url),
            database: Arc::from("rebms"),
            auth: None,
        }
    }

    #[test]
    fn document_ids_are_encoded_as_one_segment() {
        let store = store("http://localhost:5984");
        let url = store.url(Some("artifacts/app/users/u1/settings/gameConfig")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5984/rebms/artifacts%2Fapp%2Fusers%2Fu1%2Fsettings%2FgameConfig"
        );
    }

    #[test]
    fn database_url_keeps_base_path() {
        let store = store("http://localhost:5984/couch");
        assert_eq!(
            store.url(None).unwrap().as_str(),
            "http://localhost:5984/couch/rebms"
        );
    }
}
