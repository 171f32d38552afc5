//! Request-level error type and its HTTP mapping.
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::{auth::repo::StoreError, storage::UploadError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("An account with this email already exists.")]
    EmailTaken,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid request body")]
    InvalidBody(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("No account matches the given email.")]
    UnknownEmail,

    #[error("No account matches the given password.")]
    WrongPassword,

    #[error("Registration failed")]
    Registration(#[source] anyhow::Error),

    #[error("Login failed")]
    Login(#[source] anyhow::Error),

    #[error("Could not fetch users")]
    ListUsers(#[source] anyhow::Error),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmailTaken
            | AppError::Validation(_)
            | AppError::InvalidBody(_)
            | AppError::Upload(_)
            | AppError::Registration(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownEmail | AppError::WrongPassword => StatusCode::UNAUTHORIZED,
            AppError::Login(_) | AppError::ListUsers(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Underlying cause, surfaced to the caller next to the summary.
    fn detail(&self) -> Option<String> {
        match self {
            AppError::Registration(e) | AppError::Login(e) | AppError::ListUsers(e) => {
                Some(format!("{:#}", e))
            }
            AppError::InvalidBody(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Wraps a store error raised while registering. A unique-index hit is
    /// reported the same way as the pre-insert check.
    pub fn registration_store(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AppError::EmailTaken,
            other => AppError::Registration(other.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::InvalidBody(e.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
            message: self.detail(),
        };

        if status.is_server_error() || matches!(self, AppError::Registration(_)) {
            error!(%status, error = %body.error, detail = ?body.message, "request failed");
        } else {
            warn!(%status, error = %body.error, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_status() {
        assert_eq!(AppError::EmailTaken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Upload(UploadError::InvalidType).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::UnknownEmail.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::WrongPassword.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Registration(anyhow::anyhow!("boom")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Login(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::ListUsers(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_body_is_bad_request_with_reason() {
        let err = AppError::InvalidBody("missing field `password`".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = ErrorBody {
            error: err.to_string(),
            message: err.detail(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "Invalid request body");
        assert_eq!(json["message"], "missing field `password`");
    }

    #[test]
    fn duplicate_from_store_reads_as_email_taken() {
        let err = AppError::registration_store(StoreError::DuplicateEmail);
        assert!(matches!(err, AppError::EmailTaken));
    }

    #[test]
    fn fault_body_carries_underlying_message() {
        let err = AppError::Login(anyhow::anyhow!("pool timed out"));
        let body = ErrorBody {
            error: err.to_string(),
            message: err.detail(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "Login failed");
        assert_eq!(json["message"], "pool timed out");
    }

    #[test]
    fn auth_body_has_no_message_field() {
        let err = AppError::UnknownEmail;
        let body = ErrorBody {
            error: err.to_string(),
            message: err.detail(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("message").is_none());
    }
}
