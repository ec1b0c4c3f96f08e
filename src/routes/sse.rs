use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/status",
    tag = "sse",
    responses((status = 200, description = "Status SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream status messages, binding changes and leaderboard reloads.
pub async fn status_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_status(&state);
    info!("New status SSE connection");
    sse_service::to_sse_stream(receiver, sse_service::handshake_event(&state))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/status", get(status_stream))
}
