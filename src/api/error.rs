//! Control API errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::endpoint::Permission;

/// Raised when an endpoint cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("endpoint '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("endpoint '{path}' is malformed: {reason}")]
    Malformed { path: String, reason: String },
}

/// Errors returned to API callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no endpoint at '{0}'")]
    NotFound(String),

    #[error("method {method} not allowed for '{path}'")]
    MethodNotAllowed { path: String, method: String },

    #[error("access denied: '{path}' requires {required}, caller has {actual}")]
    Forbidden {
        path: String,
        required: Permission,
        actual: Permission,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
