//! Edge read-aloud text-to-speech provider
//!
//! Each text slice gets its own WebSocket session: connect, send the speech
//! config and SSML frames, then relay audio and boundary frames until
//! `turn.end`. Slices are synthesized one after another and their chunks
//! concatenated into a single stream.

pub mod protocol;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::{SinkExt, StreamExt, stream};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::EdgeTtsConfig;
use crate::error::SpeechError;
use crate::ports::{SynthesisStream, TextToSpeech};
use crate::types::SynthesisChunk;
use crate::voices::EDGE_TTS_PROVIDER;

use self::protocol::TextFrame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Text-to-speech over the Edge read-aloud WebSocket service
#[derive(Debug, Clone)]
pub struct EdgeTtsProvider {
    config: Arc<EdgeTtsConfig>,
}

impl EdgeTtsProvider {
    /// Create a provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` if the configuration is invalid.
    pub fn new(config: EdgeTtsConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;
        Ok(Self {
            config: Arc::new(config),
        })
    }
}

#[async_trait]
impl TextToSpeech for EdgeTtsProvider {
    #[instrument(skip(self, text), fields(text_len = text.len(), voice = %voice))]
    async fn stream(&self, text: &str, voice: &str) -> Result<SynthesisStream, SpeechError> {
        let pieces: Vec<String> = protocol::split_text(text, protocol::MAX_TEXT_BYTES)
            .into_iter()
            .map(str::to_string)
            .collect();

        debug!(pieces = pieces.len(), "Starting Edge TTS synthesis");

        let voice = protocol::long_voice_name(voice);
        let config = Arc::clone(&self.config);

        let chunks = stream::iter(pieces)
            .flat_map(move |piece| session(Arc::clone(&config), piece, voice.clone()));

        Ok(Box::pin(chunks))
    }

    fn provider_name(&self) -> &str {
        EDGE_TTS_PROVIDER
    }
}

/// Lazily open one session and relay its chunks
fn session(config: Arc<EdgeTtsConfig>, text: String, voice: String) -> SynthesisStream {
    let opened = stream::once(async move { open_session(&config, &text, &voice).await });

    Box::pin(opened.flat_map(|result| -> SynthesisStream {
        match result {
            Ok(ws) => relay(ws),
            Err(e) => Box::pin(stream::once(async move { Err(e) })),
        }
    }))
}

async fn open_session(
    config: &EdgeTtsConfig,
    text: &str,
    voice: &str,
) -> Result<WsStream, SpeechError> {
    let now = Utc::now();
    let connection_id = Uuid::new_v4().simple().to_string();
    let url = protocol::connection_url(&config.endpoint, &connection_id, now);

    let mut request = url.into_client_request()?;
    let headers = request.headers_mut();
    headers.insert("Origin", HeaderValue::from_static(protocol::ORIGIN));
    headers.insert("User-Agent", HeaderValue::from_static(protocol::USER_AGENT));
    headers.insert("Pragma", HeaderValue::from_static("no-cache"));
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));

    let timeout = Duration::from_millis(config.connect_timeout_ms);
    let (mut ws, _response) = tokio::time::timeout(timeout, connect_async(request))
        .await
        .map_err(|_| SpeechError::Timeout(config.connect_timeout_ms))??;

    debug!(connection_id = %connection_id, "Edge TTS session opened");

    ws.send(Message::Text(protocol::speech_config_message(now)))
        .await?;

    let request_id = Uuid::new_v4().simple().to_string();
    let ssml = protocol::build_ssml(voice, &config.rate, &config.volume, &config.pitch, text);
    ws.send(Message::Text(protocol::ssml_message(&request_id, now, &ssml)))
        .await?;

    Ok(ws)
}

/// Relay server frames as chunks until `turn.end`, an error, or close
fn relay(ws: WsStream) -> SynthesisStream {
    let frames = stream::unfold(Some(ws), |state| async move {
        let mut ws = state?;
        loop {
            match ws.next().await {
                None => {
                    let err = SpeechError::SynthesisFailed(
                        "connection closed before turn.end".to_string(),
                    );
                    return Some((vec![Err(err)], None));
                },
                Some(Err(e)) => return Some((vec![Err(e.into())], None)),
                Some(Ok(Message::Binary(data))) => match protocol::decode_binary(&data) {
                    Ok(Some(chunk)) => return Some((vec![Ok(chunk)], Some(ws))),
                    Ok(None) => {},
                    Err(e) => return Some((vec![Err(e)], None)),
                },
                Some(Ok(Message::Text(text))) => match protocol::decode_text(&text) {
                    Ok(TextFrame::TurnEnd) => {
                        if let Err(e) = ws.close(None).await {
                            debug!(error = %e, "Edge TTS close handshake failed");
                        }
                        return None;
                    },
                    Ok(TextFrame::Metadata(chunks)) if !chunks.is_empty() => {
                        let items: Vec<Result<SynthesisChunk, SpeechError>> =
                            chunks.into_iter().map(Ok).collect();
                        return Some((items, Some(ws)));
                    },
                    Ok(_) => {},
                    Err(e) => {
                        warn!(error = %e, "Skipping malformed Edge TTS metadata");
                    },
                },
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame.map_or_else(String::new, |f| f.reason.to_string());
                    let err = SpeechError::SynthesisFailed(format!(
                        "service closed the session before turn.end: {reason}"
                    ));
                    return Some((vec![Err(err)], None));
                },
                Some(Ok(_)) => {},
            }
        }
    });

    Box::pin(frames.flat_map(stream::iter))
}
