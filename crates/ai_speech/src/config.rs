//! Configuration for speech engines

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the whisper.cpp transcription engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperConfig {
    /// whisper.cpp CLI executable (name in PATH or absolute path)
    #[serde(default = "default_executable")]
    pub executable_path: PathBuf,

    /// Directory holding `ggml-<size>.bin` model files
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Model size, e.g. "tiny", "base", "small"
    #[serde(default = "default_model_size")]
    pub model_size: String,

    /// Decoder threads
    #[serde(default = "default_threads")]
    pub threads: u32,

    /// FFmpeg binary used to resample uploads
    #[serde(default)]
    pub ffmpeg_path: Option<String>,
}

fn default_executable() -> PathBuf {
    PathBuf::from("whisper-cli")
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("/app/models")
}

fn default_model_size() -> String {
    "base".to_string()
}

const fn default_threads() -> u32 {
    4
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            executable_path: default_executable(),
            models_dir: default_models_dir(),
            model_size: default_model_size(),
            threads: default_threads(),
            ffmpeg_path: None,
        }
    }
}

impl WhisperConfig {
    /// Path of the GGML model file for the configured size
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(format!("ggml-{}.bin", self.model_size))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_size.trim().is_empty() {
            return Err("Whisper model size must not be empty".to_string());
        }

        if self
            .model_size
            .contains(|c: char| c == '/' || c == '\\' || c.is_whitespace())
        {
            return Err(format!(
                "Whisper model size must be a bare name, got '{}'",
                self.model_size
            ));
        }

        if self.threads == 0 {
            return Err("Whisper threads must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Configuration for the Edge read-aloud synthesis engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeTtsConfig {
    /// WebSocket endpoint (without query string)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Speaking rate adjustment, e.g. "+0%" or "-10%"
    #[serde(default = "default_rate")]
    pub rate: String,

    /// Volume adjustment, e.g. "+0%"
    #[serde(default = "default_volume")]
    pub volume: String,

    /// Pitch adjustment, e.g. "+0Hz"
    #[serde(default = "default_pitch")]
    pub pitch: String,

    /// WebSocket connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_endpoint() -> String {
    "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1".to_string()
}

fn default_rate() -> String {
    "+0%".to_string()
}

fn default_volume() -> String {
    "+0%".to_string()
}

fn default_pitch() -> String {
    "+0Hz".to_string()
}

const fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for EdgeTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            rate: default_rate(),
            volume: default_volume(),
            pitch: default_pitch(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl EdgeTtsConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.endpoint.starts_with("wss://") || self.endpoint.starts_with("ws://")) {
            return Err(format!(
                "Edge TTS endpoint must be a ws:// or wss:// URL, got '{}'",
                self.endpoint
            ));
        }

        validate_adjustment("rate", &self.rate, "%")?;
        validate_adjustment("volume", &self.volume, "%")?;
        validate_adjustment("pitch", &self.pitch, "Hz")?;

        if self.connect_timeout_ms == 0 {
            return Err("Connect timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Prosody adjustments must be a signed integer followed by a unit
fn validate_adjustment(name: &str, value: &str, unit: &str) -> Result<(), String> {
    let valid = value
        .strip_suffix(unit)
        .and_then(|rest| rest.strip_prefix(['+', '-']))
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));

    if valid {
        Ok(())
    } else {
        Err(format!(
            "{name} must look like '+0{unit}' or '-10{unit}', got '{value}'"
        ))
    }
}
