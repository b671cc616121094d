//! Route definitions

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    error::handle_panic,
    handlers,
    middleware::propagate_request_id,
    state::{SttState, TtsState},
};

/// Layers shared by both services; the request-id span is outermost
fn with_common_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(propagate_request_id))
}

/// Create the transcription service router
pub fn create_stt_router(state: SttState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    let router = Router::new()
        .route("/transcribe", post(handlers::transcribe::transcribe))
        .route("/health", get(handlers::health::stt_health))
        .layer(body_limit)
        .with_state(state);

    with_common_layers(router)
}

/// Create the synthesis service router
pub fn create_tts_router(state: TtsState) -> Router {
    let router = Router::new()
        // OpenAI-compatible download
        .route("/v1/audio/speech", post(handlers::speech::create_speech))
        // Durable write for the telephony consumer
        .route("/v1/tts/generate", post(handlers::generate::generate))
        .route("/v1/voices", get(handlers::voices::list_voices))
        .route("/health", get(handlers::health::tts_health))
        .with_state(state);

    with_common_layers(router)
}
