//! `SynthesisGateway` trait and its HTTP/socket implementation.
//!
//! One call issues exactly one request to the selected backend and hands the
//! undecoded response back.  There is no retry and no timeout beyond the
//! transport defaults; calls share nothing but the injected HTTP client.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::SynthesisConfig;
use crate::synthesis::hts::HtsClient;
use crate::synthesis::{Backend, RawResponse, TransportError};

// ---------------------------------------------------------------------------
// SynthesisGateway trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe synthesis entry point (`Arc<dyn SynthesisGateway>`).
#[async_trait]
pub trait SynthesisGateway: Send + Sync {
    /// Ask `backend` to synthesize `text` in `language_tag`.
    ///
    /// A response with a non-success status is still `Ok`; classifying it is
    /// the decoder's job.
    async fn synthesize(
        &self,
        text: &str,
        language_tag: &str,
        backend: Backend,
    ) -> Result<RawResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// Wire bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct InlineRequest<'a> {
    tts_lang: &'a str,
    tts_data: &'a str,
}

#[derive(Debug, Serialize)]
struct ReferenceRequest<'a> {
    language: &'a str,
    text: &'a str,
    model_id: &'a str,
}

// ---------------------------------------------------------------------------
// HttpSynthesisGateway
// ---------------------------------------------------------------------------

/// Production gateway: HTTP for the `Inline` and `Reference` backends, the
/// HTS socket protocol for `Hts`.
pub struct HttpSynthesisGateway {
    client: reqwest::Client,
    config: SynthesisConfig,
    hts: HtsClient,
}

impl HttpSynthesisGateway {
    /// Build the gateway around a shared HTTP client.
    pub fn new(client: reqwest::Client, config: &SynthesisConfig) -> Self {
        Self {
            client,
            hts: HtsClient::new(config.hts.clone()),
            config: config.clone(),
        }
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        backend: Backend,
        url: &str,
        body: &B,
    ) -> Result<RawResponse, TransportError> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        log::debug!(
            "synthesis: {:?} {url} -> {status} ({} bytes)",
            backend,
            body.len()
        );

        Ok(RawResponse {
            backend,
            status: Some(status),
            body,
        })
    }
}

#[async_trait]
impl SynthesisGateway for HttpSynthesisGateway {
    async fn synthesize(
        &self,
        text: &str,
        language_tag: &str,
        backend: Backend,
    ) -> Result<RawResponse, TransportError> {
        match backend {
            Backend::Inline => {
                let body = InlineRequest {
                    tts_lang: language_tag,
                    tts_data: text,
                };
                self.post_json(backend, &self.config.inline.url, &body).await
            }
            Backend::Reference => {
                let body = ReferenceRequest {
                    language: language_tag,
                    text,
                    model_id: &self.config.reference.model_id,
                };
                self.post_json(backend, &self.config.reference.url, &body)
                    .await
            }
            Backend::Hts => self.hts.synthesize(text, language_tag).await,
        }
    }
}

// ---------------------------------------------------------------------------
// MockGateway (test double)
// ---------------------------------------------------------------------------

/// Records every call and answers with a pre-configured response.
#[cfg(test)]
pub struct MockGateway {
    response: Result<RawResponse, String>,
    pub calls: std::sync::Mutex<Vec<(String, String, Backend)>>,
}

#[cfg(test)]
impl MockGateway {
    /// Always answer with `response`.
    pub fn ok(response: RawResponse) -> Self {
        Self {
            response: Ok(response),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Always fail with a transport error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl SynthesisGateway for MockGateway {
    async fn synthesize(
        &self,
        text: &str,
        language_tag: &str,
        backend: Backend,
    ) -> Result<RawResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), language_tag.to_string(), backend));
        match &self.response {
            Ok(raw) => Ok(RawResponse {
                backend,
                ..raw.clone()
            }),
            Err(message) => Err(TransportError::Request(message.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
