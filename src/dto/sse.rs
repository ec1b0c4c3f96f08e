use serde::Serialize;
use utoipa::ToSchema;

use crate::{dto::config::LaneBindingDto, state::Readiness};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Event carrying a raw text payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
    /// Progress of the startup pipeline.
    pub readiness: Readiness,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever a binding starts, completes or the table is reloaded.
pub struct BindingsChangedEvent {
    /// Lane currently waiting for a key press.
    pub awaiting_lane: Option<u8>,
    pub bindings: Vec<LaneBindingDto>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after the leaderboard has been reloaded.
pub struct ScoresChangedEvent {
    pub music_id: String,
    pub entries: usize,
}
