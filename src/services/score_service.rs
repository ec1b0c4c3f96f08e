use rand::Rng;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::info;

use crate::{
    dao::{
        models::{JudgeCountsEntity, ScoreEntity},
        score_board::ScoreBoard,
    },
    dto::scores::{LeaderboardResponse, SubmittedScoreResponse},
    error::ServiceError,
    identity::UserId,
    services::{sse_events, status_service},
    state::SharedState,
};

const DEMO_SCORE_RANGE: std::ops::Range<u32> = 50_000..100_000;
const DEMO_MAX_COMBO: u32 = 500;
const DEMO_JUDGE: JudgeCountsEntity = JudgeCountsEntity {
    pgreat: 200,
    great: 50,
    good: 10,
    bad: 5,
    poor: 2,
};
const DISPLAY_NAME_PREFIX_LEN: usize = 4;

/// Leaderboard name derived from the user id.
pub fn display_name(user: &UserId) -> String {
    format!("User_{}", user.prefix(DISPLAY_NAME_PREFIX_LEN))
}

/// Build the mock play submitted by the demo action.
pub fn demo_score(
    user: &UserId,
    music_id: &str,
    scroll_speed: f64,
    rng: &mut impl Rng,
) -> ScoreEntity {
    ScoreEntity {
        music_id: music_id.to_string(),
        score: rng.random_range(DEMO_SCORE_RANGE),
        max_combo: DEMO_MAX_COMBO,
        judge: DEMO_JUDGE,
        timestamp: now_rfc3339(),
        user_id: user.to_string(),
        user_name: display_name(user),
        scroll_speed,
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Store `entry`, replacing the previous entry of the same user on the same track.
pub async fn submit_score(state: &SharedState, entry: &ScoreEntity) -> Result<(), ServiceError> {
    let store = state.require_document_store().await?;
    ScoreBoard::new(store, state.config().app_id.clone())
        .submit(entry)
        .await?;
    info!(user = %entry.user_id, music_id = %entry.music_id, score = entry.score, "score submitted");
    Ok(())
}

/// Submit a random score for the signed-in user, then refresh the leaderboard.
pub async fn submit_demo_score(
    state: &SharedState,
) -> Result<SubmittedScoreResponse, ServiceError> {
    let result = submit_demo(state).await;
    match &result {
        Ok(submitted) => status_service::notify(state, submitted.message.clone()).await,
        Err(err) => status_service::notify_failure(state, "Score was not saved", err).await,
    }
    let submitted = result?;

    if let Err(err) = load_top_scores(state).await {
        status_service::notify_failure(state, "Leaderboard could not be loaded", &err).await;
    }
    Ok(submitted)
}

async fn submit_demo(state: &SharedState) -> Result<SubmittedScoreResponse, ServiceError> {
    let (user, scroll_speed) = {
        let session = state.session().lock().await;
        (session.user.clone(), session.settings.scroll_speed())
    };
    let user = user.ok_or(ServiceError::Unauthenticated)?;

    let entry = demo_score(&user, &state.config().music_id, scroll_speed, &mut rand::rng());
    submit_score(state, &entry).await?;

    Ok(SubmittedScoreResponse {
        score: entry.score,
        message: format!("New high score {} saved to the cloud!", entry.score),
    })
}

/// Reload the top entries of the tracked music into the shared state.
pub async fn load_top_scores(state: &SharedState) -> Result<Vec<ScoreEntity>, ServiceError> {
    let store = state.require_document_store().await?;
    let config = state.config();
    let top = ScoreBoard::new(store, config.app_id.clone())
        .top_scores(&config.music_id, config.leaderboard_size)
        .await?;

    *state.high_scores().write().await = top.clone();
    sse_events::broadcast_scores_changed(state, &config.music_id, top.len());
    Ok(top)
}

/// Last loaded leaderboard, with the rows of the signed-in user flagged.
pub async fn leaderboard(state: &SharedState) -> LeaderboardResponse {
    let user = state.session().lock().await.user.clone();
    let entries = state.high_scores().read().await.clone();
    LeaderboardResponse::new(
        state.config().music_id.clone(),
        entries,
        user.as_ref().map(UserId::as_str),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        config::AppConfig, dao::document_store::memory::MemoryDocumentStore,
        identity::LocalIdentity, state::AppState,
    };

    async fn signed_in_state() -> SharedState {
        let config = AppConfig::default();
        let state = AppState::new(config.clone(), Arc::new(LocalIdentity::from_config(&config)));
        state
            .install_document_store(Arc::new(MemoryDocumentStore::new()))
            .await;
        state.session().lock().await.user = Some(UserId::new("abcdef123"));
        state
    }

    #[test]
    fn demo_score_matches_mock_play() {
        let mut rng = StdRng::seed_from_u64(7);
        let user = UserId::new("abcdef123");
        let entry = demo_score(&user, "MOCK_BMS_001", 2.5, &mut rng);

        assert!(DEMO_SCORE_RANGE.contains(&entry.score));
        assert_eq!(entry.max_combo, 500);
        assert_eq!(entry.judge, DEMO_JUDGE);
        assert_eq!(entry.user_name, "User_abcd");
        assert_eq!(entry.document_id(), "abcdef123_MOCK_BMS_001");
        assert_eq!(entry.scroll_speed, 2.5);
        assert!(OffsetDateTime::parse(&entry.timestamp, &Rfc3339).is_ok());
    }

    #[tokio::test]
    async fn demo_submission_refreshes_leaderboard() {
        let state = signed_in_state().await;
        let submitted = submit_demo_score(&state).await.unwrap();

        let board = leaderboard(&state).await;
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].score, submitted.score);
        assert!(board.entries[0].is_current_user);
    }

    #[tokio::test]
    async fn demo_submission_requires_user() {
        let state = signed_in_state().await;
        state.session().lock().await.user = None;
        assert!(matches!(
            submit_demo_score(&state).await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(leaderboard(&state).await.entries.is_empty());
    }
}
