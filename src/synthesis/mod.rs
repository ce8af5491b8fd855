//! Speech synthesis: remote backends and response decoding.
//!
//! # Architecture
//!
//! ```text
//! text + language tag + Backend
//!        │
//!        ▼
//! SynthesisGateway::synthesize ──▶ RawResponse { backend, status, body }
//!        │                                   │
//!        │  Inline    → POST {tts_lang, tts_data}
//!        │  Reference → POST {language, text, model_id}
//!        │  Hts       → TCP frame  token@@@text@@@model@@@language
//!        ▼
//! AudioDecoder::decode ──▶ SynthesisResponse (tagged by backend)
//!        │                   Inline(base64) │ Reference(path) │ Stream(bytes)
//!        ▼
//! PlayableAudio::Bytes { data, mime_type } │ PlayableAudio::Url
//! ```
//!
//! The gateway never inspects bodies and the decoder never guesses the
//! shape: the [`Backend`] tag decides.

pub mod decoder;
pub mod gateway;
pub mod hts;

pub use decoder::{AudioDecoder, DecodeError, PlayableAudio, SynthesisResponse};
pub use gateway::{HttpSynthesisGateway, SynthesisGateway};
pub use hts::{HtsClient, HtsRoute};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Backend selector passed with every synthesis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Answers with a base64 audio payload (bare or inside JSON).
    Inline,
    /// Answers with JSON naming an audio file on a fixed host.
    Reference,
    /// Raw-socket HTS server streaming audio bytes.
    Hts,
}

impl Backend {
    /// Short name shown next to the play buttons.
    pub fn label(self) -> &'static str {
        match self {
            Backend::Inline => "TaigiEdu",
            Backend::Reference => "HTS API",
            Backend::Hts => "HTS socket",
        }
    }
}

// ---------------------------------------------------------------------------
// RawResponse
// ---------------------------------------------------------------------------

/// Undecoded answer of one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// Backend that produced the response; selects the decoding branch.
    pub backend: Backend,
    /// HTTP status code, `None` for the socket transport.
    pub status: Option<u16>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// `false` only for an HTTP status outside `200..300`.
    pub fn is_success(&self) -> bool {
        self.status.map_or(true, |s| (200..300).contains(&s))
    }
}

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// The request never produced a response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP transport or connection error.
    #[error("synthesis request failed: {0}")]
    Request(String),

    /// Socket I/O with the HTS server failed.
    #[error("synthesis socket error: {0}")]
    Io(#[from] std::io::Error),

    /// The request could not be built (empty text, unknown language, ...).
    #[error("invalid synthesis request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e.to_string())
    }
}
