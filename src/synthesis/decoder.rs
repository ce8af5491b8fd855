//! Normalizes backend responses into one playable asset.
//!
//! Decoding runs in three steps:
//!
//! 1. A non-success HTTP status is rejected before the body is touched.
//! 2. The body is read into a [`SynthesisResponse`] according to the backend
//!    tag on the response.
//! 3. The tagged response is turned into [`PlayableAudio`]: base64 payloads
//!    and socket streams become bytes with a configured MIME type, resource
//!    paths become URLs on the configured base address.

use base64::Engine;
use thiserror::Error;

use crate::config::{InlineEncoding, SynthesisConfig};
use crate::synthesis::{Backend, RawResponse};

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Why a synthesis response could not be turned into audio.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The backend answered with a non-success HTTP status.
    #[error("synthesis service answered HTTP {status}")]
    Transport { status: u16 },

    /// The payload decoded to zero bytes.
    #[error("synthesis service returned an empty audio payload")]
    EmptyPayload,

    /// The expected JSON field is absent (or not a string).
    #[error("synthesis response has no \"{0}\" field")]
    MissingField(String),

    /// The payload is not valid base64.
    #[error("audio payload is not valid base64: {0}")]
    InvalidPayload(String),

    /// The body is not the JSON / text it should be.
    #[error("malformed synthesis response: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// SynthesisResponse / PlayableAudio
// ---------------------------------------------------------------------------

/// A response body read according to its backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisResponse {
    /// Base64 audio payload.
    Inline(String),
    /// Relative path of an audio resource.
    Reference(String),
    /// Raw audio bytes.
    Stream(Vec<u8>),
}

/// Something the player can start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayableAudio {
    /// Audio held in memory.
    Bytes { data: Vec<u8>, mime_type: String },
    /// Audio retrievable from a URL.
    Url(String),
}

impl PlayableAudio {
    /// Number of audio bytes held locally (`None` for URLs).
    pub fn byte_len(&self) -> Option<usize> {
        match self {
            PlayableAudio::Bytes { data, .. } => Some(data.len()),
            PlayableAudio::Url(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioDecoder
// ---------------------------------------------------------------------------

/// Stateless decoder configured per deployment.
#[derive(Debug, Clone)]
pub struct AudioDecoder {
    inline_encoding: InlineEncoding,
    inline_mime_type: String,
    path_field: String,
    resource_base: String,
    stream_mime_type: String,
}

impl AudioDecoder {
    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self {
            inline_encoding: config.inline.encoding.clone(),
            inline_mime_type: config.inline.mime_type.clone(),
            path_field: config.reference.path_field.clone(),
            resource_base: config.reference.resource_base.clone(),
            stream_mime_type: config.hts.mime_type.clone(),
        }
    }

    /// Decode one raw response.
    pub fn decode(&self, response: RawResponse) -> Result<PlayableAudio, DecodeError> {
        if let Some(status) = response.status.filter(|_| !response.is_success()) {
            return Err(DecodeError::Transport { status });
        }
        let tagged = self.read_body(response.backend, response.body)?;
        self.normalize(tagged)
    }

    /// Step 2: read the body the way its backend encodes it.
    pub fn read_body(&self, backend: Backend, body: Vec<u8>) -> Result<SynthesisResponse, DecodeError> {
        match backend {
            Backend::Inline => match &self.inline_encoding {
                InlineEncoding::JsonField { field } => {
                    let json = parse_json(&body)?;
                    json.get(field)
                        .and_then(|v| v.as_str())
                        .map(|s| SynthesisResponse::Inline(s.to_string()))
                        .ok_or_else(|| DecodeError::MissingField(field.clone()))
                }
                InlineEncoding::RawText => {
                    let text = String::from_utf8(body)
                        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
                    let text = text.trim();
                    // Some revisions send the payload as a JSON string literal.
                    let payload = if text.starts_with('"') {
                        serde_json::from_str::<String>(text)
                            .map_err(|e| DecodeError::Malformed(e.to_string()))?
                    } else {
                        text.to_string()
                    };
                    Ok(SynthesisResponse::Inline(payload))
                }
            },
            Backend::Reference => {
                let json = parse_json(&body)?;
                json.get(&self.path_field)
                    .and_then(|v| v.as_str())
                    .map(|s| SynthesisResponse::Reference(s.to_string()))
                    .ok_or_else(|| DecodeError::MissingField(self.path_field.clone()))
            }
            Backend::Hts => Ok(SynthesisResponse::Stream(body)),
        }
    }

    /// Step 3: turn a tagged response into playable audio.
    pub fn normalize(&self, response: SynthesisResponse) -> Result<PlayableAudio, DecodeError> {
        match response {
            SynthesisResponse::Inline(payload) => {
                let compact: String = payload
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                let data = base64::engine::general_purpose::STANDARD
                    .decode(compact.as_bytes())
                    .map_err(|e| DecodeError::InvalidPayload(e.to_string()))?;
                self.bytes(data, &self.inline_mime_type)
            }
            SynthesisResponse::Reference(path) => {
                Ok(PlayableAudio::Url(format!("{}{}", self.resource_base, path)))
            }
            SynthesisResponse::Stream(data) => self.bytes(data, &self.stream_mime_type),
        }
    }

    fn bytes(&self, data: Vec<u8>, mime_type: &str) -> Result<PlayableAudio, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }
        Ok(PlayableAudio::Bytes {
            data,
            mime_type: mime_type.to_string(),
        })
    }
}

fn parse_json(body: &[u8]) -> Result<serde_json::Value, DecodeError> {
    serde_json::from_slice(body).map_err(|e| DecodeError::Malformed(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> AudioDecoder {
        AudioDecoder::from_config(&SynthesisConfig::default())
    }

    fn raw_decoder() -> AudioDecoder {
        let mut config = SynthesisConfig::default();
        config.inline.encoding = InlineEncoding::RawText;
        config.inline.mime_type = "audio/wav".into();
        AudioDecoder::from_config(&config)
    }

    fn response(backend: Backend, status: Option<u16>, body: &[u8]) -> RawResponse {
        RawResponse {
            backend,
            status,
            body: body.to_vec(),
        }
    }

    #[test]
    fn inline_json_payload_decodes_to_bytes() {
        // "SGVsbG8gV29ybGQ=" is base64 for "Hello World"
        let raw = response(
            Backend::Inline,
            Some(200),
            br#"{"result": "SGVsbG8gV29ybGQ="}"#,
        );
        let audio = decoder().decode(raw).unwrap();

        assert_eq!(
            audio,
            PlayableAudio::Bytes {
                data: b"Hello World".to_vec(),
                mime_type: "audio/mp3".into()
            }
        );
        assert_eq!(audio.byte_len(), Some(11));
    }

    #[test]
    fn inline_raw_text_payload_uses_configured_mime() {
        let raw = response(Backend::Inline, Some(200), b"SGVsbG8gV29ybGQ=\n");
        let audio = raw_decoder().decode(raw).unwrap();

        assert_eq!(
            audio,
            PlayableAudio::Bytes {
                data: b"Hello World".to_vec(),
                mime_type: "audio/wav".into()
            }
        );
    }

    #[test]
    fn inline_raw_text_accepts_json_string_literal() {
        let raw = response(Backend::Inline, Some(200), br#""SGVsbG8gV29ybGQ=""#);
        assert_eq!(raw_decoder().decode(raw).unwrap().byte_len(), Some(11));
    }

    #[test]
    fn line_wrapped_base64_is_accepted() {
        let raw = response(Backend::Inline, Some(200), b"SGVsbG8g\nV29ybGQ=");
        assert_eq!(raw_decoder().decode(raw).unwrap().byte_len(), Some(11));
    }

    #[test]
    fn zero_length_payload_is_empty() {
        let raw = response(Backend::Inline, Some(200), br#"{"result": ""}"#);
        assert_eq!(decoder().decode(raw), Err(DecodeError::EmptyPayload));

        let raw = response(Backend::Inline, Some(200), b"");
        assert_eq!(raw_decoder().decode(raw), Err(DecodeError::EmptyPayload));
    }

    #[test]
    fn missing_inline_field() {
        let raw = response(Backend::Inline, Some(200), br#"{"error": "busy"}"#);
        assert_eq!(
            decoder().decode(raw),
            Err(DecodeError::MissingField("result".into()))
        );
    }

    #[test]
    fn null_inline_field_is_missing() {
        let raw = response(Backend::Inline, Some(200), br#"{"result": null}"#);
        assert_eq!(
            decoder().decode(raw),
            Err(DecodeError::MissingField("result".into()))
        );
    }

    #[test]
    fn invalid_base64_is_reported() {
        let raw = response(Backend::Inline, Some(200), br#"{"result": "***"}"#);
        assert!(matches!(
            decoder().decode(raw),
            Err(DecodeError::InvalidPayload(_))
        ));
    }

    #[test]
    fn non_json_body_is_malformed() {
        let raw = response(Backend::Inline, Some(200), b"<html>oops</html>");
        assert!(matches!(decoder().decode(raw), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn reference_path_is_joined_to_base() {
        let raw = response(
            Backend::Reference,
            Some(200),
            br#"{"audio_path": "/static/out/42.wav"}"#,
        );
        assert_eq!(
            decoder().decode(raw).unwrap(),
            PlayableAudio::Url("http://140.116.245.147:30011/static/out/42.wav".into())
        );
    }

    #[test]
    fn reference_without_path_is_missing_field() {
        let raw = response(Backend::Reference, Some(200), br#"{"status": "ok"}"#);
        assert_eq!(
            decoder().decode(raw),
            Err(DecodeError::MissingField("audio_path".into()))
        );
    }

    #[test]
    fn error_status_wins_over_body() {
        for backend in [Backend::Inline, Backend::Reference] {
            let raw = response(backend, Some(500), br#"{"result": "SGVsbG8="}"#);
            assert_eq!(
                decoder().decode(raw),
                Err(DecodeError::Transport { status: 500 })
            );
        }
    }

    #[test]
    fn stream_bytes_pass_through() {
        let raw = response(Backend::Hts, None, b"RIFF");
        assert_eq!(
            decoder().decode(raw).unwrap(),
            PlayableAudio::Bytes {
                data: b"RIFF".to_vec(),
                mime_type: "audio/wav".into()
            }
        );
    }

    #[test]
    fn empty_stream_is_empty_payload() {
        let raw = response(Backend::Hts, None, b"");
        assert_eq!(decoder().decode(raw), Err(DecodeError::EmptyPayload));
    }
}
