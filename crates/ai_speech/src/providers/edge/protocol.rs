//! Wire format of the Edge read-aloud synthesis service
//!
//! Client frames are text: a CRLF header block, a blank line, and a body.
//! Server audio arrives in binary frames prefixed by a big-endian `u16`
//! header length; metadata and turn markers arrive as text frames.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::SpeechError;
use crate::types::SynthesisChunk;

/// Public client token the read-aloud endpoint expects
pub const TRUSTED_CLIENT_TOKEN: &str = "6A5AA1D4EAFF4E9FB37E23D68491D6F4";

/// Browser build the `Sec-MS-GEC` token is minted for
pub const SEC_MS_GEC_VERSION: &str = "1-130.0.2849.68";

/// Codec requested from the service
pub const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// Origin header of the Edge read-aloud extension
pub const ORIGIN: &str = "chrome-extension://jdiccldimpdaibmpdkjnbmckianbfold";

/// User agent matching [`SEC_MS_GEC_VERSION`]
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0";

/// Largest text slice sent in one SSML request, in bytes
pub const MAX_TEXT_BYTES: usize = 4096;

/// Seconds between 1601-01-01 (Windows epoch) and 1970-01-01
const WINDOWS_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Tokens are valid for five-minute windows
const TOKEN_WINDOW_SECS: i64 = 300;

/// Server frame decoded from a text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFrame {
    /// Synthesis of the current request is complete
    TurnEnd,
    /// Boundary markers
    Metadata(Vec<SynthesisChunk>),
    /// `turn.start`, `response`, and anything unknown
    Ignored,
}

/// Compute the `Sec-MS-GEC` token for a point in time
///
/// Uppercase hex SHA-256 of the Windows file-time tick count (rounded down to
/// the token window) concatenated with the trusted client token.
#[must_use]
pub fn sec_ms_gec(now: DateTime<Utc>) -> String {
    let mut secs = now.timestamp() + WINDOWS_EPOCH_OFFSET_SECS;
    secs -= secs.rem_euclid(TOKEN_WINDOW_SECS);
    let ticks = i128::from(secs) * 10_000_000;

    let digest = Sha256::digest(format!("{ticks}{TRUSTED_CLIENT_TOKEN}").as_bytes());
    format!("{digest:X}")
}

/// WebSocket URL for one synthesis connection
#[must_use]
pub fn connection_url(endpoint: &str, connection_id: &str, now: DateTime<Utc>) -> String {
    format!(
        "{endpoint}?TrustedClientToken={TRUSTED_CLIENT_TOKEN}&Sec-MS-GEC={}\
         &Sec-MS-GEC-Version={SEC_MS_GEC_VERSION}&ConnectionId={connection_id}",
        sec_ms_gec(now)
    )
}

/// JavaScript `Date.toString()` rendering the service expects in `X-Timestamp`
#[must_use]
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
        .to_string()
}

/// First client frame: output format and metadata options
#[must_use]
pub fn speech_config_message(now: DateTime<Utc>) -> String {
    let body = serde_json::json!({
        "context": {
            "synthesis": {
                "audio": {
                    "metadataoptions": {
                        "sentenceBoundaryEnabled": "false",
                        "wordBoundaryEnabled": "true"
                    },
                    "outputFormat": OUTPUT_FORMAT
                }
            }
        }
    });

    format!(
        "X-Timestamp:{}\r\nContent-Type:application/json; charset=utf-8\r\n\
         Path:speech.config\r\n\r\n{body}\r\n",
        timestamp(now)
    )
}

/// Second client frame: the SSML document to speak
#[must_use]
pub fn ssml_message(request_id: &str, now: DateTime<Utc>, ssml: &str) -> String {
    format!(
        "X-RequestId:{request_id}\r\nContent-Type:application/ssml+xml\r\n\
         X-Timestamp:{}Z\r\nPath:ssml\r\n\r\n{ssml}",
        timestamp(now)
    )
}

/// Wrap escaped text in the SSML envelope for `voice`
#[must_use]
pub fn build_ssml(voice: &str, rate: &str, volume: &str, pitch: &str, text: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'>\
         <voice name='{voice}'><prosody pitch='{pitch}' rate='{rate}' volume='{volume}'>\
         {}</prosody></voice></speak>",
        escape_xml(text)
    )
}

/// Escape the five XML special characters
#[must_use]
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Expand `en-US-AriaNeural` to the service's long voice name
///
/// Names that are already long, or do not look like `xx-YY-Name`, pass
/// through unchanged.
#[must_use]
pub fn long_voice_name(short: &str) -> String {
    let mut parts = short.splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(lang), Some(region), Some(name))
            if !lang.is_empty()
                && lang.chars().all(|c| c.is_ascii_lowercase())
                && !region.is_empty()
                && region.chars().all(|c| c.is_ascii_uppercase())
                && !name.is_empty() =>
        {
            format!("Microsoft Server Speech Text to Speech Voice ({lang}-{region}, {name})")
        },
        _ => short.to_string(),
    }
}

/// Split text into slices of at most `max_bytes`, preferring whitespace
///
/// Surrounding whitespace is dropped; whitespace-only input yields nothing.
#[must_use]
pub fn split_text(text: &str, max_bytes: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = text.trim();

    while rest.len() > max_bytes {
        let mut cut = max_bytes;
        while cut > 0 && !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // A single character wider than the limit; emit it whole
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }

        let split_at = if rest[cut..].starts_with(char::is_whitespace) {
            cut
        } else {
            rest[..cut]
                .rfind(char::is_whitespace)
                .filter(|&i| i > 0)
                .unwrap_or(cut)
        };

        let (head, tail) = rest.split_at(split_at);
        let head = head.trim_end();
        if !head.is_empty() {
            pieces.push(head);
        }
        rest = tail.trim_start();
    }

    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

/// Value of header `name` in a CRLF header block
fn header_value<'a>(headers: &'a str, name: &str) -> Option<&'a str> {
    headers.split("\r\n").find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then_some(value.trim())
    })
}

/// Decode a binary server frame
///
/// Returns `Ok(None)` for frames that carry no audio.
///
/// # Errors
///
/// Returns `SpeechError::InvalidResponse` for truncated frames or headers
/// that are not UTF-8.
pub fn decode_binary(frame: &[u8]) -> Result<Option<SynthesisChunk>, SpeechError> {
    let Some((len_bytes, rest)) = frame.split_first_chunk::<2>() else {
        return Err(SpeechError::InvalidResponse(
            "binary frame shorter than its length prefix".to_string(),
        ));
    };

    let header_len = usize::from(u16::from_be_bytes(*len_bytes));
    if rest.len() < header_len {
        return Err(SpeechError::InvalidResponse(format!(
            "binary frame header claims {header_len} bytes, only {} present",
            rest.len()
        )));
    }

    let (headers, payload) = rest.split_at(header_len);
    let headers = std::str::from_utf8(headers)
        .map_err(|e| SpeechError::InvalidResponse(format!("binary frame header: {e}")))?;

    match header_value(headers, "Path") {
        Some("audio") if !payload.is_empty() => {
            Ok(Some(SynthesisChunk::Audio(Bytes::copy_from_slice(payload))))
        },
        _ => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
struct MetadataEnvelope {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Data", default)]
    data: Option<MetadataData>,
}

#[derive(Debug, Deserialize)]
struct MetadataData {
    #[serde(rename = "Offset", default)]
    offset: u64,
    #[serde(rename = "Duration", default)]
    duration: u64,
    #[serde(default)]
    text: Option<MetadataText>,
}

#[derive(Debug, Deserialize)]
struct MetadataText {
    #[serde(rename = "Text", default)]
    text: String,
}

fn parse_metadata(body: &str) -> Result<Vec<SynthesisChunk>, SpeechError> {
    let envelope: MetadataEnvelope = serde_json::from_str(body)
        .map_err(|e| SpeechError::InvalidResponse(format!("audio.metadata: {e}")))?;

    Ok(envelope
        .metadata
        .into_iter()
        .filter_map(|entry| {
            let data = entry.data?;
            let text = data.text.map(|t| t.text).unwrap_or_default();
            match entry.kind.as_str() {
                "WordBoundary" => Some(SynthesisChunk::WordBoundary {
                    offset: data.offset,
                    duration: data.duration,
                    text,
                }),
                "SentenceBoundary" => Some(SynthesisChunk::SentenceBoundary {
                    offset: data.offset,
                    duration: data.duration,
                    text,
                }),
                _ => None,
            }
        })
        .collect())
}

/// Decode a text server frame
///
/// # Errors
///
/// Returns `SpeechError::InvalidResponse` if an `audio.metadata` body is not
/// valid JSON.
pub fn decode_text(frame: &str) -> Result<TextFrame, SpeechError> {
    let (headers, body) = frame.split_once("\r\n\r\n").unwrap_or((frame, ""));

    match header_value(headers, "Path") {
        Some("turn.end") => Ok(TextFrame::TurnEnd),
        Some("audio.metadata") => parse_metadata(body).map(TextFrame::Metadata),
        _ => Ok(TextFrame::Ignored),
    }
}

/// Build a binary server frame; used by tests that stand in for the service
#[doc(hidden)]
#[must_use]
pub fn encode_audio_frame(request_id: &str, payload: &[u8]) -> Vec<u8> {
    let headers = format!("X-RequestId:{request_id}\r\nContent-Type:audio/mpeg\r\nPath:audio\r\n");
    let header_len = u16::try_from(headers.len()).unwrap_or(u16::MAX);

    let mut frame = Vec::with_capacity(2 + headers.len() + payload.len());
    frame.extend_from_slice(&header_len.to_be_bytes());
    frame.extend_from_slice(headers.as_bytes());
    frame.extend_from_slice(payload);
    frame
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 5, 14, 3, 27).unwrap()
    }

    #[test]
    fn sec_ms_gec_is_uppercase_sha256_hex() {
        let token = sec_ms_gec(fixed_now());
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn sec_ms_gec_is_stable_within_window() {
        let start = Utc.with_ymd_and_hms(2024, 11, 5, 14, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 11, 5, 14, 4, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 11, 5, 14, 5, 0).unwrap();

        assert_eq!(sec_ms_gec(start), sec_ms_gec(later));
        assert_ne!(sec_ms_gec(start), sec_ms_gec(next));
    }

    #[test]
    fn sec_ms_gec_hashes_rounded_ticks() {
        let now = fixed_now();
        let secs = now.timestamp() + WINDOWS_EPOCH_OFFSET_SECS;
        let rounded = secs - secs % 300;
        let expected = Sha256::digest(
            format!("{}{TRUSTED_CLIENT_TOKEN}", i128::from(rounded) * 10_000_000).as_bytes(),
        );

        assert_eq!(sec_ms_gec(now), format!("{expected:X}"));
    }

    #[test]
    fn connection_url_carries_tokens() {
        let url = connection_url("wss://example.test/v1", "abc123", fixed_now());

        assert!(url.starts_with("wss://example.test/v1?TrustedClientToken="));
        assert!(url.contains(&format!("Sec-MS-GEC={}", sec_ms_gec(fixed_now()))));
        assert!(url.contains("Sec-MS-GEC-Version=1-130.0.2849.68"));
        assert!(url.ends_with("&ConnectionId=abc123"));
    }

    #[test]
    fn timestamp_matches_javascript_date_string() {
        assert_eq!(
            timestamp(fixed_now()),
            "Tue Nov 05 2024 14:03:27 GMT+0000 (Coordinated Universal Time)"
        );
    }

    #[test]
    fn speech_config_selects_mp3_and_word_boundaries() {
        let message = speech_config_message(fixed_now());
        let (headers, body) = message.split_once("\r\n\r\n").unwrap();

        assert_eq!(header_value(headers, "Path"), Some("speech.config"));
        let json: serde_json::Value = serde_json::from_str(body.trim_end()).unwrap();
        let audio = &json["context"]["synthesis"]["audio"];
        assert_eq!(audio["outputFormat"], OUTPUT_FORMAT);
        assert_eq!(audio["metadataoptions"]["wordBoundaryEnabled"], "true");
    }

    #[test]
    fn ssml_message_has_path_and_request_id() {
        let message = ssml_message("req1", fixed_now(), "<speak/>");
        let (headers, body) = message.split_once("\r\n\r\n").unwrap();

        assert_eq!(header_value(headers, "Path"), Some("ssml"));
        assert_eq!(header_value(headers, "X-RequestId"), Some("req1"));
        assert!(header_value(headers, "X-Timestamp").unwrap().ends_with("Z"));
        assert_eq!(body, "<speak/>");
    }

    #[test]
    fn build_ssml_escapes_text() {
        let ssml = build_ssml("VoiceX", "+0%", "+0%", "+0Hz", "Tom & Jerry <3 'quotes'");

        assert!(ssml.contains("<voice name='VoiceX'>"));
        assert!(ssml.contains("Tom &amp; Jerry &lt;3 &apos;quotes&apos;"));
        assert!(ssml.contains("rate='+0%'"));
    }

    #[test]
    fn long_voice_name_expands_short_names() {
        assert_eq!(
            long_voice_name("en-US-AriaNeural"),
            "Microsoft Server Speech Text to Speech Voice (en-US, AriaNeural)"
        );
        assert_eq!(
            long_voice_name("en-AU-NatashaNeural"),
            "Microsoft Server Speech Text to Speech Voice (en-AU, NatashaNeural)"
        );
    }

    #[test]
    fn long_voice_name_passes_through_other_names() {
        let long = "Microsoft Server Speech Text to Speech Voice (en-US, GuyNeural)";
        assert_eq!(long_voice_name(long), long);
        assert_eq!(long_voice_name("alloy"), "alloy");
    }

    #[test]
    fn split_text_keeps_short_text_whole() {
        assert_eq!(split_text("  hello world  ", 4096), vec!["hello world"]);
        assert!(split_text("   ", 4096).is_empty());
    }

    #[test]
    fn split_text_breaks_on_whitespace() {
        let pieces = split_text("aaaa bbbb cccc", 9);
        assert_eq!(pieces, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn split_text_uses_whitespace_right_after_the_limit() {
        assert_eq!(split_text("aaaa bbbb", 4), vec!["aaaa", "bbbb"]);
        assert_eq!(split_text("ab cd ef", 5), vec!["ab cd", "ef"]);
    }

    #[test]
    fn split_text_hard_splits_long_words_on_char_boundaries() {
        let pieces = split_text("ééééé", 4);
        assert_eq!(pieces, vec!["éé", "éé", "é"]);
        assert!(pieces.iter().all(|p| p.len() <= 4));
    }

    #[test]
    fn decode_binary_extracts_audio_payload() {
        let frame = encode_audio_frame("r", b"\xff\xfbmp3");
        let chunk = decode_binary(&frame).unwrap();
        assert_eq!(
            chunk,
            Some(SynthesisChunk::Audio(Bytes::from_static(b"\xff\xfbmp3")))
        );
    }

    #[test]
    fn decode_binary_skips_empty_audio() {
        let frame = encode_audio_frame("r", b"");
        assert_eq!(decode_binary(&frame).unwrap(), None);
    }

    #[test]
    fn decode_binary_rejects_truncated_frames() {
        assert!(decode_binary(&[0x00]).is_err());
        assert!(decode_binary(&[0x00, 0x10, b'P']).is_err());
    }

    #[test]
    fn decode_text_recognises_turn_end() {
        let frame = "X-RequestId:r\r\nPath:turn.end\r\n\r\n{}";
        assert_eq!(decode_text(frame).unwrap(), TextFrame::TurnEnd);
    }

    #[test]
    fn decode_text_ignores_turn_start() {
        let frame = "X-RequestId:r\r\nContent-Type:application/json\r\nPath:turn.start\r\n\r\n{}";
        assert_eq!(decode_text(frame).unwrap(), TextFrame::Ignored);
    }

    #[test]
    fn decode_text_parses_word_boundaries() {
        let frame = "Path:audio.metadata\r\n\r\n{\"Metadata\":[\
            {\"Type\":\"WordBoundary\",\"Data\":{\"Offset\":1000000,\"Duration\":3250000,\
            \"text\":{\"Text\":\"Hello\",\"Length\":5,\"BoundaryType\":\"WordBoundary\"}}},\
            {\"Type\":\"SessionEnd\",\"Data\":{\"Offset\":0}}]}";

        let TextFrame::Metadata(chunks) = decode_text(frame).unwrap() else {
            unreachable!("expected metadata");
        };

        assert_eq!(
            chunks,
            vec![SynthesisChunk::WordBoundary {
                offset: 1_000_000,
                duration: 3_250_000,
                text: "Hello".to_string(),
            }]
        );
    }

    #[test]
    fn decode_text_rejects_bad_metadata() {
        assert!(decode_text("Path:audio.metadata\r\n\r\nnot json").is_err());
    }
}
