//! Speech processing provider implementations
//!
//! Contains concrete implementations of the `SpeechToText` and `TextToSpeech` traits.

pub mod edge;
pub mod whisper_cpp;

pub use edge::EdgeTtsProvider;
pub use whisper_cpp::WhisperCppProvider;
