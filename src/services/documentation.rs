use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for ReBMS Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::session,
        crate::routes::config::get_config,
        crate::routes::config::update_settings,
        crate::routes::config::save_config,
        crate::routes::bindings::start_binding,
        crate::routes::bindings::key_press,
        crate::routes::scores::leaderboard,
        crate::routes::scores::submit_demo_score,
        crate::routes::sse::status_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::SessionResponse,
            crate::dto::config::ConfigResponse,
            crate::dto::config::SettingsDto,
            crate::dto::config::LaneBindingDto,
            crate::dto::config::UpdateSettingsRequest,
            crate::dto::config::ActionResponse,
            crate::dto::bindings::BindingStartedResponse,
            crate::dto::bindings::KeyPressRequest,
            crate::dto::bindings::KeyPressResponse,
            crate::dto::scores::LeaderboardResponse,
            crate::dto::scores::ScoreEntryDto,
            crate::dto::scores::JudgeCountsDto,
            crate::dto::scores::SubmittedScoreResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::BindingsChangedEvent,
            crate::dto::sse::ScoresChangedEvent,
            crate::state::Readiness,
            crate::state::settings::GaugeMode,
            crate::state::status::StatusMessage,
            crate::state::status::StatusLevel,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Signed-in user and startup progress"),
        (name = "config", description = "Gameplay settings and their persistence"),
        (name = "bindings", description = "Seven-lane key rebinding"),
        (name = "scores", description = "Leaderboard of the tracked music"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "input", description = "WebSocket operations for keyboard input clients"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/session",
            "/config",
            "/config/settings",
            "/config/save",
            "/bindings/{lane}/start",
            "/bindings/keypress",
            "/scores",
            "/scores/demo",
            "/sse/status",
            "/ws/input",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
