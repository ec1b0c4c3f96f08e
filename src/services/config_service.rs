use tracing::info;

use crate::{
    dao::{
        config_store::ConfigStore, models::GameConfigEntity, storage::StorageError,
    },
    dto::config::{ConfigResponse, LaneBindingDto, SettingsDto, UpdateSettingsRequest},
    error::ServiceError,
    identity::UserId,
    services::{sse_events, status_service},
    state::{SharedState, keybinds::KeyBindingTable, settings::GameplaySettings},
};

/// What the startup load found in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored document was applied.
    Loaded,
    /// No document existed; defaults were written.
    Initialized,
}

/// Current in-memory settings and bindings.
pub async fn get_config(state: &SharedState) -> ConfigResponse {
    let session = state.session().lock().await;
    ConfigResponse {
        settings: SettingsDto::from(&session.settings),
        bindings: LaneBindingDto::all(&session.bindings),
        awaiting_lane: session.binding.pending_lane().map(|lane| lane.code()),
        unsaved_changes: session.unsaved_changes,
    }
}

/// Apply a partial settings update in memory. Either every field is applied or none.
pub async fn update_settings(
    state: &SharedState,
    request: UpdateSettingsRequest,
) -> Result<SettingsDto, ServiceError> {
    let mut session = state.session().lock().await;
    let mut updated = session.settings;
    if let Some(speed) = request.scroll_speed {
        updated.set_scroll_speed(speed)?;
    }
    if let Some(mode) = request.gauge_mode {
        updated.set_gauge_mode(mode);
    }
    if let Some(offset) = request.judge_offset {
        updated.set_judge_offset(offset)?;
    }

    if updated != session.settings {
        session.settings = updated;
        session.mark_changed();
    }
    Ok(SettingsDto::from(&session.settings))
}

/// Store the current settings and bindings as one document, reporting the outcome as a status.
pub async fn save_config(state: &SharedState) -> Result<String, ServiceError> {
    match save(state).await {
        Ok(message) => {
            status_service::notify(state, message.clone()).await;
            Ok(message)
        }
        Err(err) => {
            status_service::notify_failure(state, "Settings were not saved", &err).await;
            Err(err)
        }
    }
}

async fn save(state: &SharedState) -> Result<String, ServiceError> {
    let (user, loaded, document, revision) = {
        let session = state.session().lock().await;
        (
            session.user.clone(),
            session.config_loaded,
            GameConfigEntity::from_domain(&session.settings, &session.bindings),
            session.revision,
        )
    };
    let user = user.ok_or(ServiceError::Unauthenticated)?;
    let _busy = state.try_begin_busy()?;
    if !loaded {
        return Err(ServiceError::NotLoaded);
    }

    config_store(state).await?.save(user.as_str(), &document).await?;

    // In-memory edits made while the save was in flight stay marked as unsaved.
    state.session().lock().await.mark_saved(revision);
    info!(user = %user, revision, "settings saved");
    Ok("Settings and key bindings saved to the cloud.".into())
}

/// Apply the stored document of `user`, or store the defaults when there is none.
///
/// On failure the in-memory configuration is left as it was. A document that was read but could
/// not be applied still counts as loaded, so a later save may replace it.
pub async fn load_or_initialize(
    state: &SharedState,
    user: &UserId,
) -> Result<LoadOutcome, ServiceError> {
    let _busy = state.try_begin_busy()?;
    let store = config_store(state).await?;

    let outcome = match store.load(user.as_str()).await? {
        Some(document) => {
            let (settings, bindings) = match document.into_domain() {
                Ok(config) => config,
                Err(err) => {
                    state.session().lock().await.config_loaded = true;
                    let path = store.document_path(user.as_str()).to_string();
                    return Err(StorageError::malformed(path, err).into());
                }
            };
            replace_configuration(state, settings, bindings).await;
            LoadOutcome::Loaded
        }
        None => {
            let settings = GameplaySettings::default();
            let bindings = KeyBindingTable::default();
            store
                .save(
                    user.as_str(),
                    &GameConfigEntity::from_domain(&settings, &bindings),
                )
                .await?;
            replace_configuration(state, settings, bindings).await;
            LoadOutcome::Initialized
        }
    };

    info!(user = %user, outcome = ?outcome, "settings ready");
    Ok(outcome)
}

async fn replace_configuration(
    state: &SharedState,
    settings: GameplaySettings,
    bindings: KeyBindingTable,
) {
    let mut session = state.session().lock().await;
    session.settings = settings;
    session.bindings = bindings;
    session.revision += 1;
    session.unsaved_changes = false;
    session.config_loaded = true;

    let awaiting = session.binding.pending_lane().map(|lane| lane.code());
    sse_events::broadcast_bindings_changed(state, &session.bindings, awaiting);
}

async fn config_store(state: &SharedState) -> Result<ConfigStore, ServiceError> {
    let store = state.require_document_store().await?;
    Ok(ConfigStore::new(store, state.config().app_id.clone()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::document_store::memory::MemoryDocumentStore,
        identity::LocalIdentity,
        state::{AppState, settings::GaugeMode},
    };

    async fn state_with_store() -> (SharedState, MemoryDocumentStore) {
        let config = AppConfig::default();
        let state = AppState::new(config.clone(), Arc::new(LocalIdentity::from_config(&config)));
        let memory = MemoryDocumentStore::new();
        state.install_document_store(Arc::new(memory.clone())).await;
        (state, memory)
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let (state, _) = state_with_store().await;
        let updated = update_settings(
            &state,
            UpdateSettingsRequest {
                gauge_mode: Some(GaugeMode::Easy),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.gauge_mode, GaugeMode::Easy);
        assert_eq!(updated.scroll_speed, 3.5);
        assert!(get_config(&state).await.unsaved_changes);
    }

    #[tokio::test]
    async fn invalid_update_changes_nothing() {
        let (state, _) = state_with_store().await;
        let result = update_settings(
            &state,
            UpdateSettingsRequest {
                gauge_mode: Some(GaugeMode::Hard),
                judge_offset: Some(500),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
        let config = get_config(&state).await;
        assert_eq!(config.settings.gauge_mode, GaugeMode::Normal);
        assert!(!config.unsaved_changes);
    }

    #[tokio::test]
    async fn saving_requires_a_user() {
        let (state, _) = state_with_store().await;
        assert!(matches!(
            save_config(&state).await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn saving_before_the_first_load_is_refused() {
        let (state, memory) = state_with_store().await;
        state.session().lock().await.user = Some(UserId::new("u1"));

        assert!(matches!(
            save_config(&state).await,
            Err(ServiceError::NotLoaded)
        ));
        let path = ConfigStore::new(Arc::new(memory.clone()), "default-app-id").document_path("u1");
        assert_eq!(memory.len(path.collection()), 0);
        assert!(!state.is_busy());

        load_or_initialize(&state, &UserId::new("u1")).await.unwrap();
        assert!(save_config(&state).await.is_ok());
    }

    #[tokio::test]
    async fn first_load_writes_defaults() {
        let (state, memory) = state_with_store().await;
        let user = UserId::new("u1");

        assert_eq!(
            load_or_initialize(&state, &user).await.unwrap(),
            LoadOutcome::Initialized
        );
        let path = ConfigStore::new(Arc::new(memory.clone()), "default-app-id").document_path("u1");
        assert_eq!(memory.len(path.collection()), 1);

        assert_eq!(
            load_or_initialize(&state, &user).await.unwrap(),
            LoadOutcome::Loaded
        );
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn load_without_store_is_degraded() {
        let config = AppConfig::default();
        let state = AppState::new(config.clone(), Arc::new(LocalIdentity::from_config(&config)));
        assert!(matches!(
            load_or_initialize(&state, &UserId::new("u1")).await,
            Err(ServiceError::Degraded)
        ));
        assert!(!state.is_busy());
    }
}
