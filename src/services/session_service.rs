use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    dto::session::SessionResponse,
    error::ServiceError,
    identity::UserId,
    services::{config_service, score_service, status_service},
    state::{Readiness, SharedState},
};

/// Sign in with the configured token, falling back to an anonymous identity.
pub async fn authenticate(state: &SharedState) -> Result<UserId, ServiceError> {
    let identity = state.identity();
    if let Some(token) = state.config().initial_auth_token.clone() {
        match identity.sign_in_with_token(token).await {
            Ok(user) => return Ok(user),
            Err(err) => warn!(error = %err, "token sign-in failed; trying anonymous sign-in"),
        }
    }

    Ok(identity.sign_in_anonymous().await?)
}

/// Startup pipeline: sign in, load or create the settings document, load the leaderboard.
///
/// Every step reports its failure as a status and the pipeline carries on, so readiness always
/// ends up [`Readiness::Ready`].
pub async fn bootstrap(state: SharedState) {
    state.set_readiness(Readiness::Initializing);

    let user = match authenticate(&state).await {
        Ok(user) => {
            state.session().lock().await.user = Some(user.clone());
            Some(user)
        }
        Err(err) => {
            status_service::notify_failure(&state, "Could not sign in", &err).await;
            None
        }
    };

    if let Some(user) = &user {
        load_user_data(&state, user).await;
    } else if let Err(err) = score_service::load_top_scores(&state).await {
        status_service::notify_failure(&state, "Leaderboard could not be loaded", &err).await;
    }

    state.set_readiness(Readiness::Ready);
    info!(user = ?user.as_ref().map(UserId::as_str), "startup pipeline finished");
}

/// Load the settings document of `user` and the leaderboard, reporting each outcome as a status.
async fn load_user_data(state: &SharedState, user: &UserId) {
    match config_service::load_or_initialize(state, user).await {
        Ok(config_service::LoadOutcome::Loaded) => {
            status_service::notify(state, "Settings and key bindings loaded.").await
        }
        Ok(config_service::LoadOutcome::Initialized) => {
            status_service::notify(state, "Default settings created and saved.").await
        }
        Err(err) => {
            status_service::notify_failure(
                state,
                "Settings could not be loaded; defaults stay in effect",
                &err,
            )
            .await
        }
    }

    if let Err(err) = score_service::load_top_scores(state).await {
        status_service::notify_failure(state, "Leaderboard could not be loaded", &err).await;
    }
}

/// Keep the session user in sync with the identity provider until it goes away.
///
/// `changes` must be subscribed before this task is spawned; its current value is applied first.
pub async fn follow_identity(state: SharedState, mut changes: watch::Receiver<Option<UserId>>) {
    loop {
        let user = changes.borrow_and_update().clone();
        apply_user(&state, user).await;
        if changes.changed().await.is_err() {
            break;
        }
    }
}

async fn apply_user(state: &SharedState, user: Option<UserId>) {
    let mut session = state.session().lock().await;
    if session.user != user {
        info!(user = ?user.as_ref().map(UserId::as_str), "signed-in user changed");
        session.user = user;
    }
}

/// Retry the user data load whenever storage comes back while the settings are still unloaded.
pub async fn reload_on_reconnect(state: SharedState, mut degraded: watch::Receiver<bool>) {
    while degraded.changed().await.is_ok() {
        let is_degraded = *degraded.borrow_and_update();
        if is_degraded {
            continue;
        }

        let pending = {
            let session = state.session().lock().await;
            session.user.clone().filter(|_| !session.config_loaded)
        };
        if let Some(user) = pending {
            info!(user = %user, "storage reconnected; loading stored settings");
            load_user_data(&state, &user).await;
        }
    }
}

/// Snapshot of the session for the `/session` route.
pub async fn session_info(state: &SharedState) -> SessionResponse {
    let user = state.session().lock().await.user.clone();
    SessionResponse {
        user_id: user.map(|user| user.to_string()),
        app_id: state.config().app_id.clone(),
        music_id: state.config().music_id.clone(),
        readiness: state.readiness(),
        busy: state.is_busy(),
        degraded: state.is_degraded(),
        last_status: state.last_status().await,
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use super::*;
    use crate::{
        config::AppConfig,
        identity::{IdentityProvider, LocalIdentity},
        state::AppState,
    };

    fn state_with(config: AppConfig) -> SharedState {
        let identity = LocalIdentity::from_config(&config);
        AppState::new(config, Arc::new(identity))
    }

    #[tokio::test]
    async fn configured_token_wins() {
        let state = state_with(AppConfig {
            initial_auth_token: Some("t".into()),
            auth_tokens: HashMap::from([("t".to_string(), "player".to_string())]),
            ..AppConfig::default()
        });
        assert_eq!(authenticate(&state).await.unwrap().as_str(), "player");
    }

    #[tokio::test]
    async fn rejected_token_falls_back_to_anonymous() {
        let state = state_with(AppConfig {
            initial_auth_token: Some("stale".into()),
            ..AppConfig::default()
        });
        assert!(authenticate(&state).await.is_ok());
    }

    #[tokio::test]
    async fn both_sign_ins_failing_is_an_authentication_failure() {
        let state = state_with(AppConfig {
            initial_auth_token: Some("stale".into()),
            allow_anonymous: false,
            ..AppConfig::default()
        });
        assert!(matches!(
            authenticate(&state).await,
            Err(ServiceError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn follower_applies_a_user_signed_in_before_it_starts() {
        let config = AppConfig {
            auth_tokens: HashMap::from([("t".to_string(), "player".to_string())]),
            ..AppConfig::default()
        };
        let identity = Arc::new(LocalIdentity::from_config(&config));
        let state = AppState::new(config, identity.clone());
        let changes = identity.subscribe();

        let first = identity.sign_in_anonymous().await.unwrap();
        let follower = tokio::spawn(follow_identity(state.clone(), changes));
        wait_for_user(&state, Some(first)).await;

        let second = identity.sign_in_with_token("t".into()).await.unwrap();
        assert_eq!(second.as_str(), "player");
        wait_for_user(&state, Some(second)).await;

        follower.abort();
    }

    async fn wait_for_user(state: &SharedState, expected: Option<UserId>) {
        for _ in 0..100 {
            if state.session().lock().await.user == expected {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("session user never became {expected:?}");
    }
}
