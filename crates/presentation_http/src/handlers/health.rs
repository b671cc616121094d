//! Health check handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::state::SttState;

/// Transcription service health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttHealthResponse {
    pub status: String,
    pub model: String,
}

/// Synthesis service health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsHealthResponse {
    pub status: String,
    pub service: String,
}

/// Liveness of the transcription service and the model it was started with
pub async fn stt_health(State(state): State<SttState>) -> Json<SttHealthResponse> {
    Json(SttHealthResponse {
        status: "ok".to_string(),
        model: state.model_size,
    })
}

/// Liveness of the synthesis service
pub async fn tts_health() -> Json<TtsHealthResponse> {
    Json(TtsHealthResponse {
        status: "healthy".to_string(),
        service: ai_speech::EDGE_TTS_PROVIDER.to_string(),
    })
}
