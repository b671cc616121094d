//! OpenAI-compatible speech endpoint

use ai_speech::DEFAULT_VOICE_ID;
use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use validator::Validate;

use crate::{
    error::ApiError,
    middleware::{ValidatedJson, lenient_string},
    state::TtsState,
};

/// Message for an empty `input`
pub const NO_INPUT_TEXT: &str = "No input text provided";

/// Base name of the downloaded attachment
pub const SPEECH_BASENAME: &str = "speech";

/// Output format served regardless of `response_format`
pub const RESPONSE_FORMAT: &str = "mp3";

/// Request body of `POST /v1/audio/speech`
///
/// Optional fields tolerate `null` and non-string values and fall back to
/// their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SpeechRequest {
    /// Accepted for compatibility; the engine is fixed
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: Option<String>,

    /// Text to speak
    #[serde(default)]
    #[validate(length(min = 1, message = "No input text provided"))]
    pub input: String,

    /// External voice name
    #[serde(default, deserialize_with = "lenient_string")]
    pub voice: Option<String>,

    /// Accepted for compatibility; output is always MP3
    #[serde(default, deserialize_with = "lenient_string")]
    pub response_format: Option<String>,
}

impl SpeechRequest {
    /// Requested voice, `alloy` when absent
    #[must_use]
    pub fn voice(&self) -> &str {
        self.voice.as_deref().unwrap_or(DEFAULT_VOICE_ID)
    }

    /// Requested format, `mp3` when absent
    #[must_use]
    pub fn response_format(&self) -> &str {
        self.response_format.as_deref().unwrap_or(RESPONSE_FORMAT)
    }
}

/// `POST /v1/audio/speech`
///
/// Streams synthesis to completion and returns the MP3 bytes as an
/// attachment straight from memory.
#[instrument(skip(state, request), fields(voice = %request.voice(), chars = request.input.len()))]
pub async fn create_speech(
    State(state): State<TtsState>,
    ValidatedJson(request): ValidatedJson<SpeechRequest>,
) -> Result<Response, ApiError> {
    if request.response_format() != RESPONSE_FORMAT {
        debug!(requested = %request.response_format(), "Ignoring response_format, serving mp3");
    }

    let audio = state.synthesize(&request.input, request.voice()).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, audio.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", audio.filename(SPEECH_BASENAME)),
            ),
        ],
        audio.into_bytes(),
    )
        .into_response())
}
