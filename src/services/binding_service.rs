use tracing::debug;

use crate::{
    dto::{
        bindings::{BindingStartedResponse, KeyPressResponse},
        config::LaneBindingDto,
    },
    error::ServiceError,
    services::{sse_events, status_service},
    state::{
        SharedState,
        binding_session::KeyPressOutcome,
        keybinds::{KeyPress, Lane},
    },
};

/// Wait for the next key press to bind it to the lane with code `lane_code`.
pub async fn start_binding(
    state: &SharedState,
    lane_code: u8,
) -> Result<BindingStartedResponse, ServiceError> {
    let lane = Lane::from_code(lane_code)?;

    let started = {
        let mut session = state.session().lock().await;
        match session.binding.start_binding(lane, state.activity()) {
            Ok(started) => {
                sse_events::broadcast_bindings_changed(state, &session.bindings, Some(lane.code()));
                Ok(started)
            }
            Err(rejected) => Err(ServiceError::from(rejected)),
        }
    };

    match started {
        Ok(started) => {
            let message = format!("Press the key to assign to \"{}\"...", lane.label());
            status_service::notify(state, message.clone()).await;
            if let Some(abandoned) = started.abandoned {
                debug!(lane = %abandoned, "pending binding replaced");
            }
            Ok(BindingStartedResponse {
                lane: lane.code(),
                label: lane.label().to_string(),
                abandoned_lane: started.abandoned.map(Lane::code),
                message,
            })
        }
        Err(err) => {
            status_service::notify_failure(state, "Binding not started", &err).await;
            Err(err)
        }
    }
}

/// Hand a key press to the binding session.
///
/// When a lane is waiting the press is consumed and bound; otherwise it is left alone.
pub async fn observe_key_press(state: &SharedState, press: KeyPress) -> KeyPressResponse {
    let (outcome, binding) = {
        let mut session = state.session().lock().await;
        let session = &mut *session;
        let outcome = session
            .binding
            .observe_key_press(&mut session.bindings, &press);

        let binding = match &outcome {
            KeyPressOutcome::Bound(rebind) => {
                session.mark_changed();
                sse_events::broadcast_bindings_changed(state, &session.bindings, None);
                Some(LaneBindingDto::new(rebind.lane, &session.bindings))
            }
            KeyPressOutcome::Ignored => None,
        };
        (outcome, binding)
    };

    match outcome {
        KeyPressOutcome::Ignored => KeyPressResponse::ignored(),
        KeyPressOutcome::Bound(rebind) => {
            let message = rebind.message();
            status_service::notify(state, message.clone()).await;
            KeyPressResponse {
                consumed: true,
                message: Some(message),
                binding,
                evicted_lane: rebind.evicted.map(Lane::code),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, identity::LocalIdentity, services::config_service,
        state::AppState,
    };

    fn state() -> SharedState {
        let config = AppConfig::default();
        AppState::new(config.clone(), Arc::new(LocalIdentity::from_config(&config)))
    }

    #[tokio::test]
    async fn key_press_without_pending_lane_is_not_consumed() {
        let state = state();
        let response = observe_key_press(&state, KeyPress::new(65, "a")).await;
        assert!(!response.consumed);
        assert!(!config_service::get_config(&state).await.unsaved_changes);
    }

    #[tokio::test]
    async fn stealing_a_key_unassigns_its_old_lane() {
        let state = state();
        start_binding(&state, 13).await.unwrap();
        assert_eq!(
            config_service::get_config(&state).await.awaiting_lane,
            Some(13)
        );

        // 90 (Z) drives the scratch lane by default.
        let response = observe_key_press(&state, KeyPress::new(90, "z")).await;
        assert!(response.consumed);
        assert_eq!(response.evicted_lane, Some(11));
        assert_eq!(
            response.message.as_deref(),
            Some("Assigned \"Z\" to \"1P KEY 2\". (\"1P SCRATCH\" is now unassigned)")
        );

        let config = config_service::get_config(&state).await;
        assert_eq!(config.awaiting_lane, None);
        assert!(config.unsaved_changes);
        assert_eq!(config.bindings[0].key_name, "UNASSIGNED");
        assert_eq!(config.bindings[2].key, Some(90));
    }

    #[tokio::test]
    async fn starting_while_busy_is_rejected() {
        let state = state();
        let _busy = state.try_begin_busy().unwrap();
        assert!(matches!(
            start_binding(&state, 12).await,
            Err(ServiceError::Busy)
        ));
        assert_eq!(config_service::get_config(&state).await.awaiting_lane, None);
    }

    #[tokio::test]
    async fn second_start_replaces_first() {
        let state = state();
        start_binding(&state, 12).await.unwrap();
        let second = start_binding(&state, 15).await.unwrap();
        assert_eq!(second.abandoned_lane, Some(12));

        let session = state.session().lock().await;
        assert_eq!(session.binding.captures().active(), 1);
    }

    #[tokio::test]
    async fn unknown_lane_is_not_found() {
        assert!(matches!(
            start_binding(&state(), 42).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
