//! Synthesis server
//!
//! Serves the speech, generate, voices and health endpoints on port 5050 by
//! default.

use std::sync::Arc;

use ai_speech::{EdgeTtsProvider, SoundsDirectory};
use anyhow::Context;
use presentation_http::{
    TtsServerConfig, TtsState, create_tts_router, shutdown_signal, telemetry::init_tracing,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = TtsServerConfig::load().context("Failed to load TTS configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid TTS configuration: {e}"))?;

    init_tracing(config.log_format);

    info!("🔊 TTS server v{} starting...", env!("CARGO_PKG_VERSION"));

    let sounds = SoundsDirectory::open(&config.sounds_dir).with_context(|| {
        format!(
            "Failed to create sounds directory {}",
            config.sounds_dir.display()
        )
    })?;
    info!(sounds_dir = %sounds.root().display(), "Sounds directory ready");

    let engine = EdgeTtsProvider::new(config.edge.clone())
        .context("Failed to initialize Edge TTS provider")?;

    let state = TtsState::new(Arc::new(engine), sounds);
    let app = create_tts_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🚀 TTS server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 TTS server shutdown complete");

    Ok(())
}
