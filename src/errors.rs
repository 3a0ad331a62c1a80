use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Message shown to API clients when the registry search fails.
pub const SEARCH_FAILURE_MESSAGE: &str = "No results found, please try again";

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed or missing request input (non-numeric CVR, no search criteria).
    InvalidInput(String),
    /// Configuration needed before any network call is missing.
    ConfigurationError(String),
    /// Non-success response or network error from the registry search index.
    UpstreamSearchFailure {
        /// HTTP status when the index answered at all.
        status: Option<u16>,
        message: String,
    },
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::UpstreamSearchFailure {
            status,
            message: message.into(),
        }
    }

    /// Innermost error, with any context layers removed.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether repeating the request may succeed: 5xx answers and transport
    /// errors (timeouts, refused connections) are transient, 4xx is not.
    pub fn is_transient(&self) -> bool {
        match self.root() {
            AppError::UpstreamSearchFailure { status, .. } => match status {
                Some(code) => *code >= 500,
                None => true,
            },
            _ => false,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::UpstreamSearchFailure {
                status: Some(code),
                message,
            } => write!(f, "Upstream search failure ({}): {}", code, message),
            AppError::UpstreamSearchFailure {
                status: None,
                message,
            } => write!(f, "Upstream search failure: {}", message),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Upstream failures never leak the index's own error text to clients.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ConfigurationError(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Service is not configured".to_string(),
                )
            }
            AppError::UpstreamSearchFailure { status, message } => {
                tracing::error!(upstream_status = ?status, "Upstream search failure: {}", message);
                (StatusCode::BAD_GATEWAY, SEARCH_FAILURE_MESSAGE.to_string())
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                // Log full context chain for debugging
                tracing::error!("Error with context: {} -> {}", context, source);
                return source.clone().into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        AppError::upstream(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upstream_failure_hides_raw_text() {
        let (status, body) =
            body_of(AppError::upstream(Some(503), "shard failure: index_not_found")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], SEARCH_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_context_delegates_to_source() {
        let err: Result<(), AppError> = Err(AppError::InvalidInput("cvr must be numeric".into()));
        let err = err.context("Classifying search").unwrap_err();
        assert_eq!(err.to_string(), "Classifying search: Invalid input: cvr must be numeric");

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "cvr must be numeric");
    }

    #[tokio::test]
    async fn test_configuration_error_is_generic() {
        let (status, body) = body_of(AppError::ConfigurationError("CVR_USER not set".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Service is not configured");
    }

    #[test]
    fn test_transient_classification() {
        assert!(AppError::upstream(Some(502), "bad gateway").is_transient());
        assert!(AppError::upstream(None, "timed out").is_transient());
        assert!(!AppError::upstream(Some(401), "unauthorized").is_transient());
        assert!(!AppError::InvalidInput("x".into()).is_transient());

        let wrapped: Result<(), AppError> = Err(AppError::upstream(Some(500), "boom"));
        assert!(wrapped.context("attempt 1").unwrap_err().is_transient());
    }
}
