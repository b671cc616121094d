//! Whisper.cpp Local Speech-to-Text Provider
//!
//! Implements `SpeechToText` using the whisper.cpp CLI for local transcription.
//!
//! # Prerequisites
//!
//! - whisper.cpp's `whisper-cli` must be installed (in PATH or configured)
//! - A GGML model file named `ggml-<size>.bin` in the models directory
//! - FFmpeg, for uploads that are not already 16 kHz WAV
//!
//! # Installation
//!
//! ```bash
//! git clone https://github.com/ggerganov/whisper.cpp
//! cd whisper.cpp
//! cmake -B build && cmake --build build -j --config Release
//! ./models/download-ggml-model.sh base
//! sudo cp build/bin/whisper-cli /usr/local/bin/
//! ```

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, error, instrument, warn};

use crate::artifact::ScopedAudioFile;
use crate::config::WhisperConfig;
use crate::converter::{AudioConverter, inspect_wav};
use crate::error::SpeechError;
use crate::ports::SpeechToText;
use crate::types::{AudioFormat, Segment, Transcription};

/// Local STT provider using whisper.cpp
#[derive(Debug, Clone)]
pub struct WhisperCppProvider {
    config: WhisperConfig,
    converter: AudioConverter,
}

/// Subset of whisper.cpp's `--output-json` document
#[derive(Debug, Deserialize)]
struct WhisperJson {
    #[serde(default)]
    params: Option<WhisperParams>,
    #[serde(default)]
    result: Option<WhisperResult>,
    #[serde(default)]
    transcription: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperParams {
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WhisperResult {
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    offsets: WhisperOffsets,
    text: String,
}

/// Segment bounds in milliseconds
#[derive(Debug, Deserialize)]
struct WhisperOffsets {
    from: i64,
    to: i64,
}

impl WhisperCppProvider {
    /// Create a new whisper.cpp provider
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` if the configuration is invalid.
    pub fn new(config: WhisperConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;

        let converter = config
            .ffmpeg_path
            .as_deref()
            .map_or_else(AudioConverter::new, AudioConverter::with_ffmpeg_path);

        Ok(Self { config, converter })
    }

    /// Check whether uploads that are not 16 kHz WAV can be resampled
    pub async fn can_resample(&self) -> bool {
        self.converter.is_available().await
    }

    /// Get the whisper.cpp executable path
    fn executable(&self) -> &Path {
        &self.config.executable_path
    }

    /// Run whisper.cpp on a 16 kHz WAV file and return its parsed JSON output
    #[instrument(skip(self, wav_path), fields(model = %self.config.model_size))]
    async fn run_whisper(&self, wav_path: &Path, beam_size: u32) -> Result<WhisperJson, SpeechError> {
        let output_dir = tempfile::tempdir()?;
        let output_base = output_dir.path().join("transcript");

        let mut cmd = Command::new(self.executable());
        cmd.arg("-m")
            .arg(self.config.model_path())
            .arg("-f")
            .arg(wav_path)
            .arg("-bs")
            .arg(beam_size.to_string())
            .arg("-l")
            .arg("auto")
            .arg("-t")
            .arg(self.config.threads.to_string())
            .arg("-oj")
            .arg("-of")
            .arg(&output_base)
            .arg("-np")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Running whisper.cpp: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpeechError::NotAvailable(format!(
                    "whisper.cpp not found at '{}'",
                    self.executable().display()
                ))
            } else {
                SpeechError::TranscriptionFailed(format!("Failed to run whisper.cpp: {e}"))
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("whisper.cpp failed: {}", stderr.trim());
            return Err(SpeechError::TranscriptionFailed(format!(
                "whisper.cpp exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let raw = tokio::fs::read(output_base.with_extension("json"))
            .await
            .map_err(|e| {
                SpeechError::TranscriptionFailed(format!(
                    "Failed to read transcription output: {e}"
                ))
            })?;

        // Partial multibyte tokens can leave invalid UTF-8 in segment text
        parse_whisper_json(&String::from_utf8_lossy(&raw))
    }
}

fn parse_whisper_json(raw: &str) -> Result<WhisperJson, SpeechError> {
    serde_json::from_str(raw)
        .map_err(|e| SpeechError::InvalidResponse(format!("Malformed whisper.cpp JSON: {e}")))
}

/// Language detected by the engine, ignoring the "auto" request placeholder
fn detected_language(json: &WhisperJson) -> Option<String> {
    json.result
        .as_ref()
        .and_then(|r| r.language.clone())
        .or_else(|| json.params.as_ref().and_then(|p| p.language.clone()))
        .filter(|lang| !lang.is_empty() && lang != "auto")
}

#[allow(clippy::cast_precision_loss)]
fn millis_to_secs(ms: i64) -> f64 {
    ms.max(0) as f64 / 1000.0
}

fn into_transcription(
    json: WhisperJson,
    wav_duration: Option<f64>,
) -> Result<Transcription, SpeechError> {
    let language = detected_language(&json).ok_or_else(|| {
        SpeechError::InvalidResponse("whisper.cpp did not report a language".to_string())
    })?;

    let segments: Vec<Segment> = json
        .transcription
        .into_iter()
        .map(|s| Segment {
            start: millis_to_secs(s.offsets.from),
            end: millis_to_secs(s.offsets.to),
            text: s.text,
        })
        .collect();

    let duration = wav_duration
        .or_else(|| segments.last().map(|s| s.end))
        .unwrap_or(0.0);

    Ok(Transcription::new(segments, language, duration))
}

#[async_trait]
impl SpeechToText for WhisperCppProvider {
    #[instrument(skip(self, audio_path), fields(path = %audio_path.display()))]
    async fn transcribe(
        &self,
        audio_path: &Path,
        beam_size: u32,
    ) -> Result<Transcription, SpeechError> {
        let original = inspect_wav(audio_path);

        // Resampled copy, if one is needed, lives only as long as this call
        let resampled;
        let (wav_path, wav_info) = match original {
            Some(info) if info.is_whisper_ready() => (audio_path, Some(info)),
            _ => {
                debug!("Resampling upload to 16 kHz WAV");
                resampled = ScopedAudioFile::empty(AudioFormat::Wav)?;
                self.converter
                    .to_whisper_wav(audio_path, resampled.path())
                    .await?;
                (resampled.path(), inspect_wav(resampled.path()))
            },
        };

        let json = self.run_whisper(wav_path, beam_size).await?;
        let transcription = into_transcription(json, wav_info.map(|i| i.duration_secs))?;

        if transcription.is_empty() {
            warn!("whisper.cpp returned empty transcription");
        }

        debug!(
            language = %transcription.language,
            duration = transcription.duration,
            segments = transcription.segments.len(),
            "Transcription complete"
        );

        Ok(transcription)
    }

    async fn is_available(&self) -> bool {
        let executable_exists = self.executable().exists()
            || Command::new(self.executable())
                .arg("--help")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .is_ok_and(|s| s.success());

        let model_exists = self.config.model_path().exists();

        debug!(
            "whisper.cpp availability: executable={}, model={}",
            executable_exists, model_exists
        );

        executable_exists && model_exists
    }

    fn model_name(&self) -> &str {
        &self.config.model_size
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn test_config() -> WhisperConfig {
        WhisperConfig {
            executable_path: PathBuf::from("whisper-cli"),
            models_dir: PathBuf::from("/models"),
            model_size: "base".to_string(),
            threads: 4,
            ffmpeg_path: None,
        }
    }

    const SAMPLE_JSON: &str = r#"{
        "systeminfo": "AVX = 1",
        "model": {"type": "base"},
        "params": {"model": "/models/ggml-base.bin", "language": "auto", "translate": false},
        "result": {"language": "en"},
        "transcription": [
            {"timestamps": {"from": "00:00:00,000", "to": "00:00:02,500"},
             "offsets": {"from": 0, "to": 2500}, "text": " Hello there."},
            {"timestamps": {"from": "00:00:02,500", "to": "00:00:04,000"},
             "offsets": {"from": 2500, "to": 4000}, "text": " General Kenobi."}
        ]
    }"#;

    #[test]
    fn creates_provider_with_valid_config() {
        assert!(WhisperCppProvider::new(test_config()).is_ok());
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = test_config();
        config.threads = 0;
        assert!(matches!(
            WhisperCppProvider::new(config),
            Err(SpeechError::Configuration(_))
        ));
    }

    #[test]
    fn model_name_is_model_size() {
        let provider = WhisperCppProvider::new(test_config()).unwrap();
        assert_eq!(provider.model_name(), "base");
    }

    #[test]
    fn parses_segments_and_language() {
        let json = parse_whisper_json(SAMPLE_JSON).unwrap();
        let transcription = into_transcription(json, Some(4.2)).unwrap();

        assert_eq!(transcription.language, "en");
        assert_eq!(transcription.segments.len(), 2);
        assert!((transcription.segments[1].start - 2.5).abs() < 1e-9);
        assert_eq!(transcription.text(), "Hello there.  General Kenobi.");
        assert!((transcription.duration - 4.2).abs() < 1e-9);
    }

    #[test]
    fn duration_falls_back_to_last_segment_end() {
        let json = parse_whisper_json(SAMPLE_JSON).unwrap();
        let transcription = into_transcription(json, None).unwrap();
        assert!((transcription.duration - 4.0).abs() < 1e-9);
    }

    #[test]
    fn language_falls_back_to_params_unless_auto() {
        let json = parse_whisper_json(
            r#"{"params": {"language": "de"}, "transcription": []}"#,
        )
        .unwrap();
        assert_eq!(detected_language(&json).as_deref(), Some("de"));

        let json = parse_whisper_json(
            r#"{"params": {"language": "auto"}, "transcription": []}"#,
        )
        .unwrap();
        assert!(detected_language(&json).is_none());
        assert!(matches!(
            into_transcription(json, Some(1.0)),
            Err(SpeechError::InvalidResponse(_))
        ));
    }

    #[test]
    fn malformed_json_is_invalid_response() {
        assert!(matches!(
            parse_whisper_json("not json"),
            Err(SpeechError::InvalidResponse(_))
        ));
    }

    #[test]
    fn negative_offsets_are_clamped() {
        assert!(millis_to_secs(-20).abs() < f64::EPSILON);
        assert!((millis_to_secs(1500) - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn is_available_returns_false_when_not_installed() {
        let mut config = test_config();
        config.executable_path = PathBuf::from("/nonexistent/whisper-cli");
        let provider = WhisperCppProvider::new(config).unwrap();

        assert!(!provider.is_available().await);
    }

    #[tokio::test]
    async fn cannot_resample_without_ffmpeg() {
        let mut config = test_config();
        config.ffmpeg_path = Some("/nonexistent/ffmpeg".to_string());
        let provider = WhisperCppProvider::new(config).unwrap();

        assert!(!provider.can_resample().await);
    }

    #[tokio::test]
    async fn missing_executable_is_not_available_error() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("clip.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&wav, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let mut config = test_config();
        config.executable_path = PathBuf::from("/nonexistent/whisper-cli");
        let provider = WhisperCppProvider::new(config).unwrap();

        let result = provider.transcribe(&wav, 5).await;

        assert!(matches!(result, Err(SpeechError::NotAvailable(_))));
    }
}
