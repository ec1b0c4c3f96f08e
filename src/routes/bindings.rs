use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use validator::Validate;

use crate::{
    dto::bindings::{BindingStartedResponse, KeyPressRequest, KeyPressResponse, LanePath},
    error::AppError,
    services::binding_service,
    state::SharedState,
};

/// Routes driving the key rebinding workflow.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/bindings/{lane}/start", post(start_binding))
        .route("/bindings/keypress", post(key_press))
}

/// Wait for the next key press to assign it to a lane.
#[utoipa::path(
    post,
    path = "/bindings/{lane}/start",
    tag = "bindings",
    params(("lane" = u8, Path, description = "Lane code, 11 (scratch) to 17 (key 6)")),
    responses(
        (status = 200, description = "Binding started", body = BindingStartedResponse),
        (status = 400, description = "Lane code out of range"),
        (status = 409, description = "A load or save is in progress")
    )
)]
pub async fn start_binding(
    State(state): State<SharedState>,
    Path(path): Path<LanePath>,
) -> Result<Json<BindingStartedResponse>, AppError> {
    path.validate()?;
    Ok(Json(binding_service::start_binding(&state, path.lane).await?))
}

/// Report a key press; it is consumed only while a lane waits for a key.
#[utoipa::path(
    post,
    path = "/bindings/keypress",
    tag = "bindings",
    request_body = KeyPressRequest,
    responses(
        (status = 200, description = "Key press observed", body = KeyPressResponse),
        (status = 400, description = "Malformed key press")
    )
)]
pub async fn key_press(
    State(state): State<SharedState>,
    Json(payload): Json<KeyPressRequest>,
) -> Result<Json<KeyPressResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        binding_service::observe_key_press(&state, payload.into()).await,
    ))
}
