//! Transcription server
//!
//! Serves `POST /transcribe` and `GET /health` on port 5051 by default.

use std::sync::Arc;

use ai_speech::{SpeechToText, WhisperCppProvider};
use anyhow::Context;
use presentation_http::{
    SttServerConfig, SttState, create_stt_router, shutdown_signal, telemetry::init_tracing,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SttServerConfig::load().context("Failed to load STT configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid STT configuration: {e}"))?;

    init_tracing(config.log_format);

    info!("🎙️ STT server v{} starting...", env!("CARGO_PKG_VERSION"));

    let engine_config = config.engine_config();
    let model_path = engine_config.model_path();
    let engine = WhisperCppProvider::new(engine_config)
        .context("Failed to initialize whisper.cpp provider")?;

    if engine.is_available().await {
        info!(model = %config.whisper_model, path = %model_path.display(), "Whisper model ready");
    } else {
        warn!(
            model = %config.whisper_model,
            path = %model_path.display(),
            "whisper.cpp or its model is missing; /transcribe will fail until installed"
        );
    }

    if !engine.can_resample().await {
        warn!("FFmpeg not found; only 16 kHz WAV uploads can be transcribed");
    }

    let state = SttState::new(
        Arc::new(engine),
        config.whisper_model.clone(),
        config.max_upload_bytes,
    );
    let app = create_stt_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🚀 STT server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 STT server shutdown complete");

    Ok(())
}
