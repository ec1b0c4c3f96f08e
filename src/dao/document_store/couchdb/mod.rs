mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchDocumentStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::DeserializeValue { path, source } => StorageError::malformed(path, source),
            CouchDaoError::NotAnObject { path } => {
                StorageError::malformed(path.clone(), CouchDaoError::NotAnObject { path })
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
