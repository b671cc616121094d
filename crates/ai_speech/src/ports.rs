//! Port definitions for speech processing
//!
//! Defines the traits (ports) that speech processing adapters must implement.

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::BytesMut;
use futures::{Stream, StreamExt};

use crate::error::SpeechError;
use crate::types::{AudioData, AudioFormat, SynthesisChunk, Transcription};

/// Stream of synthesis chunks in arrival order
pub type SynthesisStream = Pin<Box<dyn Stream<Item = Result<SynthesisChunk, SpeechError>> + Send>>;

/// Port for Speech-to-Text (STT) implementations
///
/// Engines read audio from a file the caller owns; the caller decides when
/// the file goes away.
///
/// # Example
///
/// ```ignore
/// use ai_speech::SpeechToText;
///
/// async fn transcribe_upload(stt: &impl SpeechToText, path: &Path) -> Result<String, SpeechError> {
///     let transcription = stt.transcribe(path, 5).await?;
///     Ok(transcription.text())
/// }
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe the audio file at `audio_path`
    ///
    /// # Arguments
    ///
    /// * `audio_path` - File holding the audio to transcribe
    /// * `beam_size` - Beam-search width for decoding
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if transcription fails.
    async fn transcribe(
        &self,
        audio_path: &Path,
        beam_size: u32,
    ) -> Result<Transcription, SpeechError>;

    /// Check if the STT engine is installed and its model present
    async fn is_available(&self) -> bool;

    /// Get the name of the current STT model
    fn model_name(&self) -> &str;
}

/// Port for streaming Text-to-Speech (TTS) implementations
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Start synthesizing `text` with the provider-specific `voice`
    ///
    /// The returned stream yields audio and metadata chunks as the provider
    /// emits them. Use [`collect_audio`] to reduce it to a byte sequence.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if the synthesis session cannot be started.
    async fn stream(&self, text: &str, voice: &str) -> Result<SynthesisStream, SpeechError>;

    /// Name of the synthesis provider
    fn provider_name(&self) -> &str;
}

/// Drain a synthesis stream, concatenating audio chunks in arrival order
///
/// Non-audio chunks (word and sentence boundaries) are discarded. The first
/// error in the stream aborts collection.
pub async fn collect_audio(mut stream: SynthesisStream) -> Result<AudioData, SpeechError> {
    let mut buffer = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        if let SynthesisChunk::Audio(data) = chunk? {
            buffer.extend_from_slice(&data);
        }
    }

    Ok(AudioData::new(buffer.freeze(), AudioFormat::Mp3))
}
