use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::scores::{LeaderboardResponse, SubmittedScoreResponse},
    error::AppError,
    services::score_service,
    state::SharedState,
};

/// Leaderboard routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/scores", get(leaderboard))
        .route("/scores/demo", post(submit_demo_score))
}

/// Last loaded top scores of the tracked music.
#[utoipa::path(
    get,
    path = "/scores",
    tag = "scores",
    responses(
        (status = 200, description = "Leaderboard", body = LeaderboardResponse)
    )
)]
pub async fn leaderboard(State(state): State<SharedState>) -> Json<LeaderboardResponse> {
    Json(score_service::leaderboard(&state).await)
}

/// Submit a randomly generated score for the signed-in user and reload the leaderboard.
#[utoipa::path(
    post,
    path = "/scores/demo",
    tag = "scores",
    responses(
        (status = 200, description = "Score submitted", body = SubmittedScoreResponse),
        (status = 401, description = "Not signed in yet"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn submit_demo_score(
    State(state): State<SharedState>,
) -> Result<Json<SubmittedScoreResponse>, AppError> {
    Ok(Json(score_service::submit_demo_score(&state).await?))
}
