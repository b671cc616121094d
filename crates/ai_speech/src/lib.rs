//! AI Speech - transcription and synthesis engines for the speech gateway
//!
//! Provides traits and implementations for speech processing:
//! - `SpeechToText` - Transcribe an audio file to timed segments (STT)
//! - `TextToSpeech` - Stream synthesized audio for a piece of text (TTS)
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` module defines the traits (ports)
//! - `providers` module contains concrete implementations (adapters)
//! - `artifact` owns the on-disk lifetimes of audio files
//!
//! # Supported Providers
//!
//! - whisper.cpp CLI (STT), with FFmpeg resampling of non-WAV uploads
//! - Edge read-aloud WebSocket service (TTS)
//!
//! # Example
//!
//! ```ignore
//! use ai_speech::{EdgeTtsConfig, EdgeTtsProvider, TextToSpeech, VoiceSelector, collect_audio};
//!
//! let tts = EdgeTtsProvider::new(EdgeTtsConfig::default())?;
//! let voice = VoiceSelector::new().resolve("nova");
//! let audio = collect_audio(tts.stream("Hello, world!", voice).await?).await?;
//! ```

pub mod artifact;
pub mod config;
pub mod converter;
pub mod error;
pub mod ports;
pub mod providers;
pub mod types;
pub mod voices;

pub use artifact::{ScopedAudioFile, SoundsDirectory};
pub use config::{EdgeTtsConfig, WhisperConfig};
pub use converter::{AudioConverter, WavInfo, inspect_wav};
pub use error::SpeechError;
pub use ports::{SpeechToText, SynthesisStream, TextToSpeech, collect_audio};
pub use providers::{EdgeTtsProvider, WhisperCppProvider};
pub use types::{AudioData, AudioFormat, Segment, SynthesisChunk, Transcription, VoiceInfo};
pub use voices::{DEFAULT_VOICE_ID, EDGE_TTS_PROVIDER, VoiceSelector};
