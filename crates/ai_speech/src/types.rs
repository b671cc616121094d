//! Types for speech processing
//!
//! Contains data structures for audio data, transcriptions, synthesis stream
//! chunks, and voice information.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Audio formats the gateway produces or hands to engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MP3 format (synthesis output)
    Mp3,
    /// WAV format (transcription input)
    Wav,
}

impl AudioFormat {
    /// Get the MIME type for this audio format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }

    /// Get the file extension for this audio format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Container for audio data with its format
#[derive(Debug, Clone)]
pub struct AudioData {
    data: Bytes,
    format: AudioFormat,
}

impl AudioData {
    /// Create new audio data
    #[must_use]
    pub fn new(data: impl Into<Bytes>, format: AudioFormat) -> Self {
        Self {
            data: data.into(),
            format,
        }
    }

    /// Get the raw audio bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the raw audio bytes
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Get the audio format
    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Get the size of the audio data in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if the audio data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the MIME type for this audio
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// File name `<base>.<extension>` for this audio
    #[must_use]
    pub fn filename(&self, base: &str) -> String {
        format!("{}.{}", base, self.format.extension())
    }
}

/// A contiguous span of transcribed text with timing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
    /// Segment text as produced by the engine (usually with a leading space)
    pub text: String,
}

/// Result of running a transcription engine over one audio file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    /// Segments in playback order
    pub segments: Vec<Segment>,
    /// Detected language (ISO 639-1 code)
    pub language: String,
    /// Duration of the audio in seconds
    pub duration: f64,
}

impl Transcription {
    /// Create a transcription from engine output
    #[must_use]
    pub fn new(segments: Vec<Segment>, language: impl Into<String>, duration: f64) -> Self {
        Self {
            segments,
            language: language.into(),
            duration: duration.max(0.0),
        }
    }

    /// Segment texts joined with single spaces, surrounding whitespace trimmed
    #[must_use]
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    /// Check if transcription is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// One element of a streaming synthesis response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisChunk {
    /// Encoded audio bytes
    Audio(Bytes),
    /// Word timing marker
    WordBoundary {
        /// Offset from the start of the audio in 100ns ticks
        offset: u64,
        /// Duration in 100ns ticks
        duration: u64,
        /// The spoken word
        text: String,
    },
    /// Sentence timing marker
    SentenceBoundary {
        /// Offset from the start of the audio in 100ns ticks
        offset: u64,
        /// Duration in 100ns ticks
        duration: u64,
        /// The spoken sentence
        text: String,
    },
}

/// Information about an available voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// External voice identifier
    pub id: String,
    /// Provider-specific voice name
    pub name: String,
    /// Synthesis provider that owns the voice
    pub provider: String,
}

impl VoiceInfo {
    /// Create a new voice info
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider: provider.into(),
        }
    }
}
