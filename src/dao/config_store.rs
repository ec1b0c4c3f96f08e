//! Per-user settings document.

use std::sync::Arc;

use serde_json::{from_value, to_value};

use crate::dao::{
    document_store::{CollectionPath, DocumentPath, DocumentStore},
    models::GameConfigEntity,
    storage::{StorageError, StorageResult},
};

const SETTINGS_DOCUMENT_ID: &str = "gameConfig";

/// Reads and writes `artifacts/{appId}/users/{userId}/settings/gameConfig`.
#[derive(Clone)]
pub struct ConfigStore {
    store: Arc<dyn DocumentStore>,
    app_id: String,
}

impl ConfigStore {
    pub fn new(store: Arc<dyn DocumentStore>, app_id: impl Into<String>) -> Self {
        Self {
            store,
            app_id: app_id.into(),
        }
    }

    /// Location of the settings document of `user_id`.
    pub fn document_path(&self, user_id: &str) -> DocumentPath {
        CollectionPath::new(["artifacts", self.app_id.as_str(), "users", user_id, "settings"])
            .document(SETTINGS_DOCUMENT_ID)
    }

    /// Fetch the stored document; `None` on first run.
    pub async fn load(&self, user_id: &str) -> StorageResult<Option<GameConfigEntity>> {
        let path = self.document_path(user_id);
        let Some(raw) = self.store.get_document(path.clone()).await? else {
            return Ok(None);
        };

        from_value(raw)
            .map(Some)
            .map_err(|err| StorageError::malformed(path.to_string(), err))
    }

    /// Overwrite the whole document.
    pub async fn save(&self, user_id: &str, config: &GameConfigEntity) -> StorageResult<()> {
        let path = self.document_path(user_id);
        let data = to_value(config).map_err(|err| StorageError::malformed(path.to_string(), err))?;
        self.store.set_document(path, data).await
    }
}
