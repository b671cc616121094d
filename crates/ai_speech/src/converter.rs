//! Audio preparation for local transcription
//!
//! whisper.cpp only decodes 16 kHz PCM WAV. Uploads arrive in whatever format
//! the client recorded, so anything else is resampled through FFmpeg first.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::SpeechError;

/// Sample rate whisper.cpp expects
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Header facts about a WAV file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    /// Samples per second
    pub sample_rate: u32,
    /// Channel count
    pub channels: u16,
    /// Playback length in seconds
    pub duration_secs: f64,
}

impl WavInfo {
    /// Check if whisper.cpp can read this file without resampling
    #[must_use]
    pub const fn is_whisper_ready(&self) -> bool {
        self.sample_rate == WHISPER_SAMPLE_RATE
    }
}

/// Read the WAV header at `path`
///
/// Returns `None` when the file is not a WAV file hound understands.
pub fn inspect_wav(path: &Path) -> Option<WavInfo> {
    let reader = hound::WavReader::open(path).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }

    Some(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        duration_secs: f64::from(reader.duration()) / f64::from(spec.sample_rate),
    })
}

/// Audio converter backed by the FFmpeg binary
#[derive(Debug, Clone, Default)]
pub struct AudioConverter {
    /// FFmpeg binary path (defaults to "ffmpeg" in PATH)
    ffmpeg_path: Option<String>,
}

impl AudioConverter {
    /// Create a new audio converter with default settings
    #[must_use]
    pub const fn new() -> Self {
        Self { ffmpeg_path: None }
    }

    /// Create a new audio converter with a custom FFmpeg path
    #[must_use]
    pub fn with_ffmpeg_path(path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: Some(path.into()),
        }
    }

    /// Get the FFmpeg binary path
    fn ffmpeg_path(&self) -> &str {
        self.ffmpeg_path.as_deref().unwrap_or("ffmpeg")
    }

    /// Check if FFmpeg is available on the system
    #[instrument(skip(self))]
    pub async fn is_available(&self) -> bool {
        Command::new(self.ffmpeg_path())
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|status| status.success())
    }

    /// Resample `input` into a 16 kHz mono PCM WAV at `output`
    ///
    /// `output` is overwritten if it exists.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::AudioProcessing` if FFmpeg cannot be spawned,
    /// exits unsuccessfully, or produces an empty file.
    #[instrument(skip(self), fields(input = %input.display()))]
    pub async fn to_whisper_wav(&self, input: &Path, output: &Path) -> Result<(), SpeechError> {
        let output_result = Command::new(self.ffmpeg_path())
            .arg("-i")
            .arg(input)
            .args(["-ar", "16000", "-ac", "1", "-codec:a", "pcm_s16le"])
            .args(["-f", "wav", "-y", "-loglevel", "error"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SpeechError::AudioProcessing(format!("Failed to spawn FFmpeg: {e}")))?;

        if !output_result.status.success() {
            let stderr = String::from_utf8_lossy(&output_result.stderr);
            return Err(SpeechError::AudioProcessing(format!(
                "FFmpeg conversion failed: {}",
                stderr.trim()
            )));
        }

        let written = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(SpeechError::AudioProcessing(
                "FFmpeg produced empty output".to_string(),
            ));
        }

        debug!(bytes = written, "Conversion to 16 kHz WAV complete");
        Ok(())
    }
}
