//! Application state shared across handlers

use std::{fmt, sync::Arc};

use ai_speech::{
    AudioData, SoundsDirectory, SpeechToText, TextToSpeech, VoiceSelector, collect_audio,
};
use tracing::debug;

use crate::error::ApiError;

/// Message returned when synthesis produced no audio
pub const TTS_GENERATION_FAILED: &str = "TTS generation failed";

/// Shared state of the transcription service
#[derive(Clone)]
pub struct SttState {
    /// Transcription engine
    pub engine: Arc<dyn SpeechToText>,
    /// Model size reported by `/health`, fixed at startup
    pub model_size: String,
    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
}

impl SttState {
    /// Create transcription state
    pub fn new(
        engine: Arc<dyn SpeechToText>,
        model_size: impl Into<String>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            engine,
            model_size: model_size.into(),
            max_upload_bytes,
        }
    }
}

impl fmt::Debug for SttState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SttState")
            .field("model_size", &self.model_size)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}

/// Shared state of the synthesis service
#[derive(Clone)]
pub struct TtsState {
    /// Streaming synthesis engine
    pub engine: Arc<dyn TextToSpeech>,
    /// External-to-provider voice table
    pub voices: VoiceSelector,
    /// Durable artifact directory
    pub sounds: SoundsDirectory,
}

impl TtsState {
    /// Create synthesis state with the standard voice table
    pub fn new(engine: Arc<dyn TextToSpeech>, sounds: SoundsDirectory) -> Self {
        Self {
            engine,
            voices: VoiceSelector::new(),
            sounds,
        }
    }

    /// Synthesize `text` with the external voice `voice`
    ///
    /// Unknown voices fall back to the default. Only audio chunks are kept.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Engine` if the engine fails or yields no audio.
    pub async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioData, ApiError> {
        let provider_voice = self.voices.resolve(voice);
        debug!(voice = %voice, provider_voice = %provider_voice, "Resolved voice");

        let stream = self.engine.stream(text, provider_voice).await?;
        let audio = collect_audio(stream).await?;

        if audio.is_empty() {
            return Err(ApiError::Engine(TTS_GENERATION_FAILED.to_string()));
        }

        debug!(bytes = audio.size_bytes(), "Synthesis complete");
        Ok(audio)
    }
}

impl fmt::Debug for TtsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsState")
            .field("provider", &self.engine.provider_name())
            .field("voices", &self.voices)
            .field("sounds", &self.sounds)
            .finish()
    }
}
