//! Durable synthesis endpoint for the telephony integration

use ai_speech::{DEFAULT_VOICE_ID, SoundsDirectory};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    error::ApiError,
    middleware::{ValidatedJson, lenient_string},
    state::TtsState,
};

/// Artifact id used when the request names none
pub const DEFAULT_UNIQUE_ID: &str = "default";

/// Request body of `POST /v1/tts/generate`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateRequest {
    /// Text to speak
    #[serde(default)]
    #[validate(length(min = 1, message = "No input text provided"))]
    pub input: String,

    /// Correlation id naming the output file; numbers are used as text
    #[serde(default, deserialize_with = "lenient_string")]
    pub unique_id: Option<String>,

    /// External voice name
    #[serde(default, deserialize_with = "lenient_string")]
    pub voice: Option<String>,
}

impl GenerateRequest {
    /// Requested id, `default` when absent
    #[must_use]
    pub fn unique_id(&self) -> &str {
        self.unique_id.as_deref().unwrap_or(DEFAULT_UNIQUE_ID)
    }

    /// Requested voice, `alloy` when absent
    #[must_use]
    pub fn voice(&self) -> &str {
        self.voice.as_deref().unwrap_or(DEFAULT_VOICE_ID)
    }
}

/// Response of `POST /v1/tts/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub status: String,
    /// Absolute path of the written file
    pub audio_file: String,
    /// The text that was spoken
    pub text: String,
}

/// `POST /v1/tts/generate`
///
/// Writes `response_<unique_id>.mp3` into the sounds directory, replacing
/// any earlier file for the same id. The file is left for the consumer.
#[instrument(skip(state, request), fields(unique_id = %request.unique_id(), voice = %request.voice()))]
pub async fn generate(
    State(state): State<TtsState>,
    ValidatedJson(request): ValidatedJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let unique_id = request.unique_id();
    SoundsDirectory::validate_id(unique_id)?;

    let audio = state.synthesize(&request.input, request.voice()).await?;
    let path = state.sounds.write(unique_id, audio.data()).await?;

    info!(path = %path.display(), bytes = audio.size_bytes(), "Wrote synthesized audio");

    Ok(Json(GenerateResponse {
        status: "success".to_string(),
        audio_file: path.display().to_string(),
        text: request.input,
    }))
}
