//! Defines the `ApiError` type for the control surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::error::AppError;

/// An error that can be turned into an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// The webhook sender is not the configured chat.
    Forbidden,

    /// Anything that went wrong inside the service. The detail is logged,
    /// never returned to the caller.
    Internal(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "status": "error", "message": "Unauthorized" }),
            ),
            ApiError::Internal(err) => {
                log::error!("Internal server error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": "error", "message": "An internal server error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
