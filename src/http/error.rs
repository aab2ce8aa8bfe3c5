//! Mapping engine errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::error::Error;

/// An error ready to be rendered as `{"error": code, "message": text}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_json", message)
    }

    #[cfg(test)]
    fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
            }
            // Storage failures are transient; the caller decides whether to retry.
            Error::Storage(_) | Error::Migration(_) | Error::Io(_) => {
                error!(error = %err, "storage failure");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage_error",
                    "storage unavailable, retry later",
                )
            }
            Error::Config(_) | Error::Other(_) => {
                error!(error = %err, "internal failure");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status, self.code, self.message)
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::from(Error::Validation {
            field: "delay",
            reason: "bad".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_maps_to_service_unavailable() {
        let err = ApiError::from(Error::Storage(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
