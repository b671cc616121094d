//! Voice listing

use ai_speech::VoiceInfo;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::state::TtsState;

/// Response of `GET /v1/voices`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
}

/// `GET /v1/voices`: the static voice table in listing order
pub async fn list_voices(State(state): State<TtsState>) -> Json<VoicesResponse> {
    Json(VoicesResponse {
        voices: state.voices.voices(),
    })
}
