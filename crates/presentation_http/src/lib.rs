//! HTTP presentation layer for the speech services
//!
//! Two routers share this crate: the transcription service (`stt-server`)
//! and the synthesis service (`tts-server`).

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod shutdown;
pub mod state;
pub mod telemetry;

pub use crate::config::{LogFormat, SttServerConfig, TtsServerConfig};
pub use error::ApiError;
pub use middleware::{RequestId, ValidatedJson};
pub use routes::{create_stt_router, create_tts_router};
pub use shutdown::shutdown_signal;
pub use state::{SttState, TtsState};
