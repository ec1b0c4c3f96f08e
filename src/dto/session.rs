use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{Readiness, status::StatusMessage};

#[derive(Debug, Serialize, ToSchema)]
/// Who is signed in and what the backend is doing.
pub struct SessionResponse {
    pub user_id: Option<String>,
    pub app_id: String,
    pub music_id: String,
    pub readiness: Readiness,
    /// A load or save is in flight.
    pub busy: bool,
    /// No document store is reachable.
    pub degraded: bool,
    pub last_status: Option<StatusMessage>,
}
