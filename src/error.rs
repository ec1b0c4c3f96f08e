use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    identity::IdentityError,
    state::{
        binding_session::BindingRejected, keybinds::UnknownLane, settings::SettingsError,
    },
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend rejected or failed the operation.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Both sign-in paths failed.
    #[error("authentication failed")]
    Authentication(#[source] IdentityError),
    /// The operation needs a signed-in user.
    #[error("not signed in yet")]
    Unauthenticated,
    /// A load or save is already in flight.
    #[error("another operation is in progress")]
    Busy,
    /// The stored settings have not been read yet; saving would overwrite them.
    #[error("stored settings not loaded yet")]
    NotLoaded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Guard rejections leave the state untouched and are not failures.
    pub fn is_guard_rejection(&self) -> bool {
        matches!(
            self,
            ServiceError::Unauthenticated | ServiceError::Busy | ServiceError::NotLoaded
        )
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<IdentityError> for ServiceError {
    fn from(err: IdentityError) -> Self {
        ServiceError::Authentication(err)
    }
}

impl From<SettingsError> for ServiceError {
    fn from(err: SettingsError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<UnknownLane> for ServiceError {
    fn from(err: UnknownLane) -> Self {
        ServiceError::NotFound(err.to_string())
    }
}

impl From<BindingRejected> for ServiceError {
    fn from(err: BindingRejected) -> Self {
        match err {
            BindingRejected::Busy => ServiceError::Busy,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Authentication(source) => AppError::Unauthorized(source.to_string()),
            ServiceError::Unauthenticated => AppError::Unauthorized("not signed in yet".into()),
            ServiceError::Busy => AppError::Conflict("another operation is in progress".into()),
            ServiceError::NotLoaded => AppError::Conflict("stored settings not loaded yet".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejections_map_to_client_errors() {
        let busy: AppError = ServiceError::Busy.into();
        assert_eq!(busy.into_response().status(), StatusCode::CONFLICT);

        let anonymous: AppError = ServiceError::Unauthenticated.into();
        assert_eq!(anonymous.into_response().status(), StatusCode::UNAUTHORIZED);

        let not_loaded: AppError = ServiceError::NotLoaded.into();
        assert_eq!(not_loaded.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn settings_errors_are_bad_requests() {
        let err: ServiceError = SettingsError::JudgeOffsetOutOfRange(300).into();
        let app: AppError = err.into();
        assert_eq!(app.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn only_guards_count_as_rejections() {
        assert!(ServiceError::Busy.is_guard_rejection());
        assert!(ServiceError::NotLoaded.is_guard_rejection());
        assert!(!ServiceError::Degraded.is_guard_rejection());
    }
}
