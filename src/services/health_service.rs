use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report storage connectivity and startup progress, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let mut healthy = false;
    match state.require_document_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => healthy = true,
            Err(err) => warn!(error = %err, "storage health check failed"),
        },
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    if healthy && !state.is_degraded() {
        HealthResponse::ok(state.readiness())
    } else {
        HealthResponse::degraded(state.readiness())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::document_store::memory::MemoryDocumentStore,
        identity::LocalIdentity,
        state::{AppState, Readiness},
    };

    fn state() -> SharedState {
        let config = AppConfig::default();
        let identity = LocalIdentity::from_config(&config);
        AppState::new(config, Arc::new(identity))
    }

    #[tokio::test]
    async fn degraded_without_store() {
        let response = health_status(&state()).await;
        assert_eq!(response.status, "degraded");
        assert_eq!(response.readiness, Readiness::Initializing);
    }

    #[tokio::test]
    async fn ok_with_reachable_store() {
        let state = state();
        state
            .install_document_store(Arc::new(MemoryDocumentStore::new()))
            .await;
        state.set_readiness(Readiness::Ready);

        let response = health_status(&state).await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.readiness, Readiness::Ready);
    }

    #[tokio::test]
    async fn unreachable_store_reports_degraded() {
        let state = state();
        let store = Arc::new(MemoryDocumentStore::new());
        store.set_offline(true);
        state.install_document_store(store).await;

        assert_eq!(health_status(&state).await.status, "degraded");
    }
}
