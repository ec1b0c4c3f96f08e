use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        config::LaneBindingDto,
        sse::{BindingsChangedEvent, ScoresChangedEvent, ServerEvent, SystemStatus},
    },
    state::{SharedState, keybinds::KeyBindingTable, status::StatusMessage},
};

pub const EVENT_STATUS: &str = "status";
pub const EVENT_BINDINGS_CHANGED: &str = "bindings.changed";
pub const EVENT_SCORES_CHANGED: &str = "scores.changed";
pub const EVENT_SYSTEM_STATUS: &str = "system.status";
pub const EVENT_HANDSHAKE: &str = "handshake";

/// Broadcast a status message.
pub fn broadcast_status(state: &SharedState, status: &StatusMessage) {
    send_event(state, EVENT_STATUS, status);
}

/// Broadcast the binding table and the lane waiting for a key.
pub fn broadcast_bindings_changed(
    state: &SharedState,
    table: &KeyBindingTable,
    awaiting_lane: Option<u8>,
) {
    let payload = BindingsChangedEvent {
        awaiting_lane,
        bindings: LaneBindingDto::all(table),
    };
    send_event(state, EVENT_BINDINGS_CHANGED, &payload);
}

/// Broadcast that the leaderboard was reloaded.
pub fn broadcast_scores_changed(state: &SharedState, music_id: &str, entries: usize) {
    let payload = ScoresChangedEvent {
        music_id: music_id.to_string(),
        entries,
    };
    send_event(state, EVENT_SCORES_CHANGED, &payload);
}

/// Broadcast a degraded mode change.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
