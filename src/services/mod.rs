/// Key rebinding workflow.
pub mod binding_service;
/// Settings and key binding edits, load and save.
pub mod config_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Leaderboard submission and loading.
pub mod score_service;
/// Sign-in and the startup pipeline.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Status line publication.
pub mod status_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
