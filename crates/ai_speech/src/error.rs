//! Speech processing errors

use thiserror::Error;

/// Errors that can occur during speech processing
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Failed to connect to the synthesis service
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Transcription failed
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Synthesis failed
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Invalid response from an engine
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Timeout while connecting to an engine
    #[error("Speech processing timeout after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Audio processing/conversion failed
    #[error("Audio processing failed: {0}")]
    AudioProcessing(String),

    /// Provider not available (not installed or configured)
    #[error("Provider not available: {0}")]
    NotAvailable(String),

    /// Caller-supplied artifact identifier cannot name a file
    #[error("Invalid artifact id: {0}")]
    InvalidArtifactId(String),

    /// Filesystem failure while staging or persisting audio
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for SpeechError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match err {
            WsError::Io(e) => Self::ConnectionFailed(e.to_string()),
            WsError::Http(response) => Self::ConnectionFailed(format!(
                "handshake rejected with HTTP {}",
                response.status()
            )),
            other => Self::SynthesisFailed(other.to_string()),
        }
    }
}
