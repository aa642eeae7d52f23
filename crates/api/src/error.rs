//! App-boundary error wrapper.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use credilock_domain::CredilockError;
use serde_json::json;
use tracing::warn;

/// Wraps domain errors so handlers can use `?` and still produce a
/// consistent JSON error body.
#[derive(Debug)]
pub struct ApiError(pub CredilockError);

impl From<CredilockError> for ApiError {
    fn from(err: CredilockError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CredilockError::NotFound(_) => StatusCode::NOT_FOUND,
            CredilockError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CredilockError::Gateway(_) | CredilockError::Network(_) => StatusCode::BAD_GATEWAY,
            CredilockError::Auth(_) => StatusCode::BAD_GATEWAY,
            CredilockError::Database(_)
            | CredilockError::Config(_)
            | CredilockError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            warn!(error = %self.0, status = status.as_u16(), "request failed");
        }

        (status, Json(json!({ "error": self.0 }))).into_response()
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
