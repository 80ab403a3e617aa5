use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The main error type for launchdesk services
#[derive(Debug, thiserror::Error)]
pub enum LaunchdeskError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl LaunchdeskError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns a message safe to expose to clients.
    ///
    /// Client errors (4xx) carry their full message since the caller needs
    /// to know what went wrong. Server errors (5xx) collapse to a generic
    /// message; the detail is logged server-side only.
    fn safe_message(&self) -> String {
        match self {
            Self::NotFound(_)
            | Self::BadRequest(_)
            | Self::Unauthorized(_)
            | Self::Forbidden(_)
            | Self::Conflict(_) => self.to_string(),
            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
            Self::ServiceUnavailable(_) => "Service unavailable".to_string(),
        }
    }
}

/// Standard error response body for API errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_id: Option<String>,
}

impl IntoResponse for LaunchdeskError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        tracing::error!(
            status = status.as_u16(),
            error_id = %error_id,
            error = %self,
            "Request failed"
        );

        let body = Json(ErrorResponse {
            error: self.safe_message(),
            error_id: Some(error_id),
        });

        (status, body).into_response()
    }
}

/// Result type alias for launchdesk operations
pub type Result<T> = std::result::Result<T, LaunchdeskError>;

// Common error type conversions

impl From<serde_json::Error> for LaunchdeskError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            LaunchdeskError::BadRequest(format!("JSON error: {}", err))
        } else {
            LaunchdeskError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

impl From<reqwest::Error> for LaunchdeskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LaunchdeskError::ServiceUnavailable(format!("Upstream timeout: {}", err))
        } else if err.is_connect() {
            LaunchdeskError::ServiceUnavailable(format!("Connection error: {}", err))
        } else if err.is_status() {
            match err.status().map(|s| s.as_u16()) {
                Some(401) => LaunchdeskError::Unauthorized("Upstream authentication failed".to_string()),
                Some(403) => LaunchdeskError::Forbidden("Upstream access denied".to_string()),
                Some(404) => LaunchdeskError::NotFound("Upstream resource not found".to_string()),
                Some(503) => LaunchdeskError::ServiceUnavailable("Upstream service unavailable".to_string()),
                _ => LaunchdeskError::Internal(format!("Upstream error: {}", err)),
            }
        } else {
            LaunchdeskError::Internal(format!("Request error: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let err = LaunchdeskError::bad_request("message exceeds 500 characters");
        assert_eq!(
            err.safe_message(),
            "Bad request: message exceeds 500 characters"
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn server_errors_are_masked() {
        let err = LaunchdeskError::internal("connection pool exhausted");
        assert_eq!(err.safe_message(), "Internal server error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = LaunchdeskError::conflict("open request already exists");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
