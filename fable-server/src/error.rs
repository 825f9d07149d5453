//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fable_core::FableError;
use serde::Serialize;

/// Result alias for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// A core error on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub FableError);

impl From<FableError> for ApiError {
    fn from(e: FableError) -> Self {
        ApiError(e)
    }
}

/// Structured failure body; never carries internal storage detail
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FableError::NotFound(_) => StatusCode::NOT_FOUND,
            FableError::Unauthenticated => StatusCode::UNAUTHORIZED,
            // Covers both failed logins and bad session tokens
            FableError::InvalidCredential => StatusCode::BAD_REQUEST,
            FableError::Forbidden(_) => StatusCode::FORBIDDEN,
            FableError::Validation(_) => StatusCode::BAD_REQUEST,
            // The interface pins duplicate-username to 400
            FableError::Conflict(_) => StatusCode::BAD_REQUEST,
            FableError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self.0 {
            FableError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                error: self.0.kind(),
                message,
            }),
        )
            .into_response()
    }
}
