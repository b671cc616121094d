//! Transcription handler

use ai_speech::{AudioFormat, ScopedAudioFile};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{error::ApiError, state::SttState};

/// Beam width used for every transcription
pub const DEFAULT_BEAM_SIZE: u32 = 5;

/// Multipart field carrying the audio
pub const FILE_FIELD: &str = "file";

/// Message for a request without an audio upload
pub const NO_FILE_PROVIDED: &str = "No file provided";

/// Transcription response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeResponse {
    /// Segment texts joined with single spaces
    pub text: String,
    /// Detected language
    pub language: String,
    /// Audio length in seconds
    pub duration: f64,
}

/// Map a multipart read failure, keeping the body-limit status
fn upload_error(err: &MultipartError) -> ApiError {
    let message = format!("Invalid upload: {}", err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::Validation(message)
    }
}

/// Read the bytes of the `file` field, skipping any other parts
///
/// Only a part carrying a filename counts as a file upload.
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| upload_error(&e))?;

        let Some(field) = field else {
            return Err(ApiError::Validation(NO_FILE_PROVIDED.to_string()));
        };

        if field.name() == Some(FILE_FIELD) && field.file_name().is_some() {
            let data = field.bytes().await.map_err(|e| upload_error(&e))?;
            return Ok(data.to_vec());
        }
    }
}

/// `POST /transcribe`
///
/// The upload is staged in a private temp file that is removed when this
/// handler returns, whether transcription succeeded or not.
#[instrument(skip(state, multipart))]
pub async fn transcribe(
    State(state): State<SttState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "Request is not multipart");
        ApiError::Validation(NO_FILE_PROVIDED.to_string())
    })?;

    let data = read_upload(multipart).await?;
    let upload = ScopedAudioFile::write(&data, AudioFormat::Wav).await?;

    let transcription = state
        .engine
        .transcribe(upload.path(), DEFAULT_BEAM_SIZE)
        .await?;

    let text = transcription.text();
    info!(
        language = %transcription.language,
        duration = transcription.duration,
        chars = text.len(),
        "Transcribed upload"
    );

    Ok(Json(TranscribeResponse {
        text,
        language: transcription.language,
        duration: transcription.duration,
    }))
}
