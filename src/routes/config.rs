use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use validator::Validate;

use crate::{
    dto::config::{ActionResponse, ConfigResponse, SettingsDto, UpdateSettingsRequest},
    error::AppError,
    services::config_service,
    state::SharedState,
};

/// Routes reading, editing and saving the gameplay settings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/config", get(get_config))
        .route("/config/settings", put(update_settings))
        .route("/config/save", post(save_config))
}

/// Current in-memory settings, key bindings and pending binding.
#[utoipa::path(
    get,
    path = "/config",
    tag = "config",
    responses(
        (status = 200, description = "Current configuration", body = ConfigResponse)
    )
)]
pub async fn get_config(State(state): State<SharedState>) -> Json<ConfigResponse> {
    Json(config_service::get_config(&state).await)
}

/// Change one or more gameplay settings in memory.
#[utoipa::path(
    put,
    path = "/config/settings",
    tag = "config",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = SettingsDto),
        (status = 400, description = "Value out of range")
    )
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsDto>, AppError> {
    payload.validate()?;
    Ok(Json(config_service::update_settings(&state, payload).await?))
}

/// Store the settings and key bindings of the signed-in user.
#[utoipa::path(
    post,
    path = "/config/save",
    tag = "config",
    responses(
        (status = 200, description = "Configuration saved", body = ActionResponse),
        (status = 401, description = "Not signed in yet"),
        (status = 409, description = "Another load or save is in progress, or stored settings not loaded yet"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn save_config(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    let message = config_service::save_config(&state).await?;
    Ok(Json(ActionResponse { message }))
}
