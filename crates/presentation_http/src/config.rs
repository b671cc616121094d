//! Server configuration
//!
//! Layering, lowest priority first: built-in defaults, the optional
//! `speech.toml` file (`[stt]` / `[tts]` tables), `SPEECH_`-prefixed
//! environment variables (`SPEECH_STT__PORT`, `SPEECH_TTS__EDGE__RATE`), and
//! finally the unprefixed `WHISPER_MODEL` / `SOUNDS_DIR` variables.

use std::path::{Path, PathBuf};

use ai_speech::{EdgeTtsConfig, WhisperConfig};
use config::{Config, ConfigError, Environment, File, Map, builder::DefaultState};
use serde::{Deserialize, Serialize};

/// Optional configuration file read from the working directory
pub const CONFIG_FILE: &str = "speech.toml";

/// Prefix for layered environment overrides
pub const ENV_PREFIX: &str = "SPEECH";

/// Model size override for the transcription service
pub const WHISPER_MODEL_ENV: &str = "WHISPER_MODEL";

/// Durable artifact directory override for the synthesis service
pub const SOUNDS_DIR_ENV: &str = "SOUNDS_DIR";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Transcription service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_stt_port")]
    pub port: u16,

    /// Whisper model size, reported by `/health`
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Largest accepted upload body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// whisper.cpp engine settings
    #[serde(default)]
    pub whisper: WhisperConfig,
}

/// Synthesis service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_tts_port")]
    pub port: u16,

    /// Directory durable artifacts are written to
    #[serde(default = "default_sounds_dir")]
    pub sounds_dir: PathBuf,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Edge read-aloud engine settings
    #[serde(default)]
    pub edge: EdgeTtsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_stt_port() -> u16 {
    5051
}

const fn default_tts_port() -> u16 {
    5050
}

fn default_whisper_model() -> String {
    "base".to_string()
}

const fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_sounds_dir() -> PathBuf {
    PathBuf::from("/app/sounds")
}

impl Default for SttServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_stt_port(),
            whisper_model: default_whisper_model(),
            log_format: LogFormat::default(),
            max_upload_bytes: default_max_upload_bytes(),
            whisper: WhisperConfig::default(),
        }
    }
}

impl Default for TtsServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_tts_port(),
            sounds_dir: default_sounds_dir(),
            log_format: LogFormat::default(),
            edge: EdgeTtsConfig::default(),
        }
    }
}

/// File and prefixed-environment layers shared by both services
fn layered(file: Option<&Path>, env: &Map<String, String>) -> config::ConfigBuilder<DefaultState> {
    let mut builder = Config::builder();
    if let Some(path) = file {
        builder = builder.add_source(File::from(path).required(false));
    }

    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(Some(env.clone())),
    )
}

fn process_env() -> Map<String, String> {
    std::env::vars().collect()
}

impl SttServerConfig {
    /// Load from `speech.toml` and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(Some(Path::new(CONFIG_FILE)), &process_env())
    }

    /// Load from an explicit file and environment map
    pub fn from_sources(file: Option<&Path>, env: &Map<String, String>) -> Result<Self, ConfigError> {
        layered(file, env)
            .set_default("stt.host", default_host())?
            .set_default("stt.port", i64::from(default_stt_port()))?
            .set_override_option("stt.whisper_model", env.get(WHISPER_MODEL_ENV).cloned())?
            .build()?
            .get("stt")
    }

    /// whisper.cpp settings with the configured model size applied
    #[must_use]
    pub fn engine_config(&self) -> WhisperConfig {
        WhisperConfig {
            model_size: self.whisper_model.clone(),
            ..self.whisper.clone()
        }
    }

    /// `host:port` to bind
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }
        self.engine_config().validate()
    }
}

impl TtsServerConfig {
    /// Load from `speech.toml` and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(Some(Path::new(CONFIG_FILE)), &process_env())
    }

    /// Load from an explicit file and environment map
    pub fn from_sources(file: Option<&Path>, env: &Map<String, String>) -> Result<Self, ConfigError> {
        layered(file, env)
            .set_default("tts.host", default_host())?
            .set_default("tts.port", i64::from(default_tts_port()))?
            .set_override_option("tts.sounds_dir", env.get(SOUNDS_DIR_ENV).cloned())?
            .build()?
            .get("tts")
    }

    /// `host:port` to bind
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.sounds_dir.as_os_str().is_empty() {
            return Err("sounds_dir must not be empty".to_string());
        }
        self.edge.validate()
    }
}
