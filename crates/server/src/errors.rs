use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_access::CoreAccessError;
use ragstore::StoreError;
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// This enum encapsulates the different kinds of errors that can occur within
/// the server, allowing them to be converted into appropriate HTTP responses.
pub enum AppError {
    /// Malformed or invalid input.
    BadRequest(String),
    /// Valid identity, insufficient role or permission.
    Forbidden(String),
    /// A referenced entity does not exist.
    NotFound(String),
    /// Errors originating from the access-control layer.
    Access(CoreAccessError),
    /// Errors originating from the storage layer.
    Store(StoreError),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<CoreAccessError> for AppError {
    fn from(err: CoreAccessError) -> Self {
        AppError::Access(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Access(err) => match &err {
                CoreAccessError::NotFound(entity) => {
                    (StatusCode::NOT_FOUND, format!("{entity} not found."))
                }
                CoreAccessError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                CoreAccessError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, err.to_string())
                }
                CoreAccessError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
                CoreAccessError::MissingSeedData(_) => {
                    error!("Configuration error: {err}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server is not configured correctly.".to_string(),
                    )
                }
                CoreAccessError::Database(_)
                | CoreAccessError::PasswordHash
                | CoreAccessError::DataIntegrity(_) => {
                    error!("CoreAccessError: {err:?}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal server error occurred.".to_string(),
                    )
                }
            },
            AppError::Store(err) => match &err {
                StoreError::NotFound(entity) => {
                    (StatusCode::NOT_FOUND, format!("{entity} not found."))
                }
                StoreError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                StoreError::UnsupportedFileType(_) | StoreError::InvalidEncoding => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                StoreError::Connection(_)
                | StoreError::OperationFailed(_)
                | StoreError::Database(_)
                | StoreError::DataIntegrity(_) => {
                    error!("StoreError: {err:?}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal server error occurred.".to_string(),
                    )
                }
            },
            AppError::Internal(err) => {
                error!("Internal server error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
