use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::session::SessionResponse, services::session_service, state::SharedState};

/// Session introspection routes.
pub fn router() -> Router<SharedState> {
    Router::new().route("/session", get(session))
}

/// Signed-in user, startup progress and the last status message.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Session snapshot", body = SessionResponse)
    )
)]
pub async fn session(State(state): State<SharedState>) -> Json<SessionResponse> {
    Json(session_service::session_info(&state).await)
}
