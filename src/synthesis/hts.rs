//! Client for the raw-socket HTS synthesis server.
//!
//! Wire format of one request (one connection per request):
//!
//! ```text
//! ┌──────────────────┬────────────────────────────────────────────┐
//! │ u32 big-endian   │ UTF-8: token@@@text@@@model@@@language     │
//! │ payload length   │                                            │
//! └──────────────────┴────────────────────────────────────────────┘
//! ```
//!
//! The server answers with the audio file and closes the connection.  The
//! port and, for Mandarin, the model are fixed per language.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::HtsBackendConfig;
use crate::synthesis::{Backend, RawResponse, TransportError};

const FIELD_SEPARATOR: &str = "@@@";

/// Port and model a language is served by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtsRoute {
    pub port: u16,
    pub model: String,
}

impl HtsRoute {
    /// Resolve the server route for `language`.
    ///
    /// | language                              | port  | model      |
    /// |---------------------------------------|-------|------------|
    /// | `chinese`                             | 10015 | `M60`      |
    /// | `taiwanese`, `tailuo`                 | 10011 | configured |
    /// | `taiwanese_sandhi`, `tailuo_sandhi`   | 10012 | configured |
    /// | anything containing `hakka`           | 10010 | configured |
    pub fn resolve(language: &str, model: &str) -> Result<Self, TransportError> {
        let route = |port: u16, model: &str| HtsRoute {
            port,
            model: model.to_string(),
        };
        match language {
            "chinese" => Ok(route(10015, "M60")),
            "taiwanese" | "tailuo" => Ok(route(10011, model)),
            "taiwanese_sandhi" | "tailuo_sandhi" => Ok(route(10012, model)),
            l if l.contains("hakka") => Ok(route(10010, model)),
            other => Err(TransportError::InvalidRequest(format!(
                "unsupported HTS language \"{other}\"; expected chinese, taiwanese, \
                 taiwanese_sandhi, tailuo, tailuo_sandhi or hakka"
            ))),
        }
    }
}

/// Build one length-prefixed request frame.
pub fn encode_frame(token: &str, text: &str, model: &str, language: &str) -> Vec<u8> {
    let payload = [token, text, model, language].join(FIELD_SEPARATOR);
    let payload = payload.as_bytes();
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Stateless HTS socket client.
#[derive(Debug, Clone)]
pub struct HtsClient {
    config: HtsBackendConfig,
}

impl HtsClient {
    pub fn new(config: HtsBackendConfig) -> Self {
        Self { config }
    }

    /// Send one synthesis request and read the audio stream to EOF.
    pub async fn synthesize(&self, text: &str, language: &str) -> Result<RawResponse, TransportError> {
        if text.is_empty() {
            return Err(TransportError::InvalidRequest(
                "text to synthesize must not be empty".into(),
            ));
        }

        let route = HtsRoute::resolve(language, &self.config.model)?;
        let port = self.config.port.unwrap_or(route.port);
        let frame = encode_frame(&self.config.token, text, &route.model, language);

        log::debug!(
            "hts: {}:{} model={} language={} ({} bytes)",
            self.config.host,
            port,
            route.model,
            language,
            frame.len()
        );

        let mut stream = TcpStream::connect((self.config.host.as_str(), port)).await?;
        stream.write_all(&frame).await?;
        stream.flush().await?;

        let mut body = Vec::new();
        stream.read_to_end(&mut body).await?;

        log::debug!("hts: received {} bytes", body.len());

        Ok(RawResponse {
            backend: Backend::Hts,
            status: None,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn config_for(port: u16) -> HtsBackendConfig {
        HtsBackendConfig {
            host: "127.0.0.1".into(),
            port: Some(port),
            ..HtsBackendConfig::default()
        }
    }

    #[test]
    fn routes_by_language() {
        assert_eq!(
            HtsRoute::resolve("chinese", "M10").unwrap(),
            HtsRoute {
                port: 10015,
                model: "M60".into()
            }
        );
        assert_eq!(HtsRoute::resolve("tailuo", "M10").unwrap().port, 10011);
        assert_eq!(HtsRoute::resolve("taiwanese", "F01").unwrap().model, "F01");
        assert_eq!(HtsRoute::resolve("tailuo_sandhi", "M10").unwrap().port, 10012);
        assert_eq!(HtsRoute::resolve("hakka_sixian", "M10").unwrap().port, 10010);
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(matches!(
            HtsRoute::resolve("klingon", "M10"),
            Err(TransportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn frame_has_big_endian_length_prefix() {
        let frame = encode_frame("tok", "台灣", "M10", "taiwanese");
        let payload = "tok@@@台灣@@@M10@@@taiwanese".as_bytes();
        assert_eq!(&frame[..4], &(payload.len() as u32).to_be_bytes());
        assert_eq!(&frame[4..], payload);
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_connecting() {
        let client = HtsClient::new(config_for(1));
        let err = client.synthesize("", "taiwanese").await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn round_trip_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut len = [0u8; 4];
            socket.read_exact(&mut len).await.unwrap();
            let mut payload = vec![0u8; u32::from_be_bytes(len) as usize];
            socket.read_exact(&mut payload).await.unwrap();
            socket.write_all(b"RIFF....WAVE").await.unwrap();
            String::from_utf8(payload).unwrap()
        });

        let client = HtsClient::new(config_for(port));
        let raw = client.synthesize("gua2", "tailuo").await.unwrap();

        assert_eq!(raw.backend, Backend::Hts);
        assert_eq!(raw.status, None);
        assert_eq!(raw.body, b"RIFF....WAVE");
        assert_eq!(server.await.unwrap(), "mi2stts@@@gua2@@@M10@@@tailuo");
    }

    #[tokio::test]
    async fn connection_refused_is_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = HtsClient::new(config_for(port));
        let err = client.synthesize("gua2", "tailuo").await.unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
