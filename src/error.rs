//! Error types for the channel ops server
//!
//! Provides unified error handling using thiserror.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::audit::Role;
use crate::models::ErrorResponse;

// == Ops Error Enum ==
/// Unified error type for the channel ops server.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid construction parameters, fatal at startup
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Unknown job, or a job in the wrong state for the operation
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid admin credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller role is below the endpoint minimum
    #[error("Role '{actual}' is below required role '{required}'")]
    Forbidden { required: Role, actual: Role },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Channel is in maintenance mode
    #[error("Channel in maintenance: {0}")]
    Maintenance(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for OpsError {
    fn into_response(self) -> Response {
        let status = match &self {
            OpsError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OpsError::NotFound(_) => StatusCode::NOT_FOUND,
            OpsError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            OpsError::Forbidden { .. } => StatusCode::FORBIDDEN,
            OpsError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            OpsError::Maintenance(_) => StatusCode::SERVICE_UNAVAILABLE,
            OpsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Extractor Rejections ==
// Malformed bodies and query strings answer with the same JSON error shape.
impl From<JsonRejection> for OpsError {
    fn from(rejection: JsonRejection) -> Self {
        OpsError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for OpsError {
    fn from(rejection: QueryRejection) -> Self {
        OpsError::InvalidRequest(rejection.body_text())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the channel ops server.
pub type Result<T> = std::result::Result<T, OpsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (OpsError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (OpsError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (
                OpsError::Forbidden {
                    required: Role::Admin,
                    actual: Role::Viewer,
                },
                StatusCode::FORBIDDEN,
            ),
            (OpsError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (OpsError::Maintenance("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (OpsError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_forbidden_message_names_roles() {
        let err = OpsError::Forbidden {
            required: Role::Approver,
            actual: Role::Executor,
        };
        assert_eq!(
            err.to_string(),
            "Role 'executor' is below required role 'approver'"
        );
    }
}
