use serde::Serialize;
use utoipa::ToSchema;

use crate::state::Readiness;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Progress of the startup pipeline.
    pub readiness: Readiness,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(readiness: Readiness) -> Self {
        Self {
            status: "ok".to_string(),
            readiness,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(readiness: Readiness) -> Self {
        Self {
            status: "degraded".to_string(),
            readiness,
        }
    }
}
