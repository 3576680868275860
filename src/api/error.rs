//! HTTP error mapping for the stats API.

use crate::core::StatsError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Failures surfaced to HTTP callers as plain-text bodies.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing query parameter
    BadRequest(String),
    /// Requested window predates retained history
    OutOfRange(String),
    /// Anything the caller could not have avoided
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::OutOfRange(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text returned to the caller
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) | ApiError::OutOfRange(msg) | ApiError::Internal(msg) => msg,
        }
    }
}

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::OutOfRange { .. } => ApiError::OutOfRange(err.to_string()),
            err if err.is_caller_error() => ApiError::BadRequest(err.to_string()),
            err => {
                tracing::error!(category = err.category(), "Stats request failed: {}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if !matches!(self, ApiError::Internal(_)) {
            tracing::warn!(%status, "Rejected stats request: {}", self.message());
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{}\n", self.message()),
        )
            .into_response()
    }
}
