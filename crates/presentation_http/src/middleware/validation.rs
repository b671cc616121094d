//! Request validation
//!
//! Provides a `ValidatedJson` extractor that deserializes a JSON body and
//! runs its `validator` rules, reporting failures as `ApiError::Validation`.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use tracing::debug;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// Message for a body that is absent or not JSON
pub const NO_JSON_DATA: &str = "No JSON data provided";

/// A JSON extractor that also validates the request body
///
/// Any JSON rejection (missing content type, empty body, syntax error,
/// wrong field types) becomes `"No JSON data provided"`. Rule failures
/// report their own messages.
///
/// # Example
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct SpeechRequest {
///     #[serde(default)]
///     #[validate(length(min = 1, message = "No input text provided"))]
///     input: String,
/// }
///
/// async fn handler(ValidatedJson(req): ValidatedJson<SpeechRequest>) {
///     // req.input is non-empty
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            debug!(reason = %rejection.body_text(), "Rejected JSON body");
            ApiError::Validation(NO_JSON_DATA.to_string())
        })?;

        value
            .validate()
            .map_err(|e| ApiError::Validation(describe(&e)))?;

        Ok(Self(value))
    }
}

/// Deserialize an optional string field without rejecting odd JSON
///
/// Strings pass through and numbers are rendered as text. `null` and any
/// other value read as absent, so the field falls back to its default.
///
/// Use with `#[serde(default, deserialize_with = "lenient_string")]`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Join rule messages, falling back to `field: code` for rules without one
fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error.message.as_ref().map_or_else(
                    || format!("{field}: {}", error.code),
                    ToString::to_string,
                )
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::StatusCode, routing::post};
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct TestRequest {
        #[serde(default)]
        #[validate(length(min = 1, message = "No input text provided"))]
        input: String,
        #[validate(range(min = 1, max = 10))]
        #[serde(default = "one")]
        count: u32,
    }

    const fn one() -> u32 {
        1
    }

    async fn test_handler(ValidatedJson(req): ValidatedJson<TestRequest>) -> String {
        req.input
    }

    fn create_test_app() -> Router {
        Router::new().route("/test", post(test_handler))
    }

    async fn send(body: &'static str, content_type: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().method("POST").uri("/test");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }

        let response = create_test_app()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn valid_request_passes() {
        let (status, body) = send(r#"{"input": "hello"}"#, Some("application/json")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn empty_input_reports_rule_message() {
        let (status, body) = send(r#"{"input": ""}"#, Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"No input text provided"}"#);
    }

    #[tokio::test]
    async fn missing_input_reports_rule_message() {
        let (status, body) = send("{}", Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"No input text provided"}"#);
    }

    #[tokio::test]
    async fn rule_without_message_reports_field_and_code() {
        let (status, body) = send(r#"{"input": "x", "count": 100}"#, Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"count: range"}"#);
    }

    #[tokio::test]
    async fn invalid_json_is_no_json_data() {
        let (status, body) = send(r#"{"input": not json}"#, Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"No JSON data provided"}"#);
    }

    #[tokio::test]
    async fn missing_content_type_is_no_json_data() {
        let (status, body) = send(r#"{"input": "hello"}"#, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"No JSON data provided"}"#);
    }

    #[derive(Debug, Deserialize)]
    struct LenientRequest {
        #[serde(default, deserialize_with = "lenient_string")]
        name: Option<String>,
    }

    fn lenient(json: &str) -> Option<String> {
        serde_json::from_str::<LenientRequest>(json).unwrap().name
    }

    #[test]
    fn lenient_string_accepts_any_json_value() {
        assert_eq!(lenient(r#"{"name": "aria"}"#).as_deref(), Some("aria"));
        assert_eq!(lenient(r#"{"name": 42}"#).as_deref(), Some("42"));
        assert_eq!(lenient(r#"{"name": null}"#), None);
        assert_eq!(lenient(r#"{"name": [1, 2]}"#), None);
        assert_eq!(lenient(r#"{"name": {"a": 1}}"#), None);
        assert_eq!(lenient("{}"), None);
    }

    #[tokio::test]
    async fn empty_body_is_no_json_data() {
        let (status, _) = send("", Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
