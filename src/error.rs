use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error taxonomy for the whole API surface. Every failure carries a
/// human-readable message; the HTTP mapping lives in `IntoResponse`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid credential.
    #[error("{0}")]
    Authentication(String),
    /// Valid credential, but not allowed to touch the entity.
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// Malformed input; the caller must correct and resubmit.
    #[error("{0}")]
    Validation(String),
    /// The request conflicts with current state (e.g. deleting an
    /// enrolled course); retrying unchanged will not help.
    #[error("{0}")]
    Conflict(String),
    /// An external collaborator (asset host, payment processor,
    /// identity provider) failed; the operation aborted before commit.
    #[error("{0}")]
    Dependency(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Dependency(_) | ApiError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({ "success": false, "message": self.to_string() }));
        (status, body).into_response()
    }
}
