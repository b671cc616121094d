//! API error handling
//!
//! Every error renders as `{"error": <message>}` so clients of either
//! service see one shape.

use std::any::Any;

use ai_speech::SpeechError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request itself is unusable
    #[error("{0}")]
    Validation(String),

    /// The request body exceeds the configured limit
    #[error("{0}")]
    PayloadTooLarge(String),

    /// A speech engine failed
    #[error("{0}")]
    Engine(String),

    /// Anything else that went wrong on our side
    #[error("{0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Engine(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Validation(_) | Self::PayloadTooLarge(_) => {},
            Self::Engine(msg) => error!(error = %msg, "Speech engine failed"),
            Self::Internal(msg) => error!(error = %msg, "Internal error"),
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<SpeechError> for ApiError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::InvalidArtifactId(_) => Self::Validation(err.to_string()),
            other => Self::Engine(other.to_string()),
        }
    }
}

/// Render a caught handler panic as a 500
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    ApiError::Internal(format!("Request handler panicked: {detail}")).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn api_error_messages_are_bare() {
        assert_eq!(
            ApiError::Validation("No file provided".to_string()).to_string(),
            "No file provided"
        );
        assert_eq!(ApiError::Engine("boom".to_string()).to_string(), "boom");
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::Validation(String::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PayloadTooLarge(String::new()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::Engine(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn response_body_has_only_error_field() {
        let response = ApiError::Validation("No input text provided".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json, serde_json::json!({"error": "No input text provided"}));
    }

    #[test]
    fn speech_error_converts_to_engine() {
        let err: ApiError = SpeechError::TranscriptionFailed("bad audio".to_string()).into();
        let ApiError::Engine(msg) = err else {
            unreachable!("expected Engine");
        };
        assert_eq!(msg, "Transcription failed: bad audio");
    }

    #[test]
    fn invalid_artifact_id_converts_to_validation() {
        let err: ApiError = SpeechError::InvalidArtifactId("../x".to_string()).into();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn panic_payload_is_reported() {
        let response = handle_panic(Box::new("worker exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(
            json["error"],
            "Request handler panicked: worker exploded"
        );
    }
}
