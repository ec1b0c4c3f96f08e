use tracing::{error, info};

use crate::{
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        status::{StatusLevel, StatusMessage},
    },
};

/// Record `status` as the last status, log it and push it to SSE subscribers.
pub async fn publish(state: &SharedState, status: StatusMessage) {
    match status.level {
        StatusLevel::Info => info!(status = %status.message, "status"),
        StatusLevel::Error => error!(status = %status.message, "status"),
    }
    sse_events::broadcast_status(state, &status);
    state.set_last_status(status).await;
}

pub async fn notify(state: &SharedState, message: impl Into<String>) {
    publish(state, StatusMessage::info(message)).await;
}

/// Report a failed operation. Guard rejections are reported at info level.
pub async fn notify_failure(state: &SharedState, context: &str, err: &ServiceError) {
    let message = format!("{context}: {err}");
    let status = if err.is_guard_rejection() {
        StatusMessage::info(message)
    } else {
        StatusMessage::error(message)
    };
    publish(state, status).await;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        identity::LocalIdentity,
        services::sse_events::EVENT_STATUS,
        state::AppState,
    };

    fn state() -> SharedState {
        AppState::new(
            AppConfig::default(),
            Arc::new(LocalIdentity::from_config(&AppConfig::default())),
        )
    }

    #[tokio::test]
    async fn published_status_is_stored_and_broadcast() {
        let state = state();
        let mut rx = state.sse().subscribe();

        notify(&state, "saved").await;

        assert_eq!(state.last_status().await, Some(StatusMessage::info("saved")));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_STATUS));
        assert!(event.data.contains("saved"));
    }

    #[tokio::test]
    async fn guard_rejections_are_not_errors() {
        let state = state();
        notify_failure(&state, "Save skipped", &ServiceError::Busy).await;
        assert_eq!(state.last_status().await.unwrap().level, StatusLevel::Info);

        notify_failure(&state, "Save failed", &ServiceError::Degraded).await;
        assert_eq!(state.last_status().await.unwrap().level, StatusLevel::Error);
    }
}
