//! Corpus loaders: local file or HTTP resource.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::CorpusConfig;
use crate::corpus::parse::parse_corpus;
use crate::corpus::{CorpusError, SentencePair};

/// Produces the finite, eagerly-loaded sentence list.
#[async_trait]
pub trait CorpusLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<SentencePair>, CorpusError>;
}

/// Reads the corpus from a file on disk.
pub struct FileCorpusLoader {
    path: PathBuf,
    config: CorpusConfig,
}

impl FileCorpusLoader {
    pub fn new(path: impl Into<PathBuf>, config: CorpusConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }
}

#[async_trait]
impl CorpusLoader for FileCorpusLoader {
    async fn load(&self) -> Result<Vec<SentencePair>, CorpusError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let pairs = parse_corpus(&text, &self.config)?;
        log::info!(
            "corpus: loaded {} sentences from {}",
            pairs.len(),
            self.path.display()
        );
        Ok(pairs)
    }
}

/// Fetches the corpus over HTTP.
pub struct HttpCorpusLoader {
    client: reqwest::Client,
    url: String,
    config: CorpusConfig,
}

impl HttpCorpusLoader {
    pub fn new(client: reqwest::Client, url: impl Into<String>, config: CorpusConfig) -> Self {
        Self {
            client,
            url: url.into(),
            config,
        }
    }
}

#[async_trait]
impl CorpusLoader for HttpCorpusLoader {
    async fn load(&self) -> Result<Vec<SentencePair>, CorpusError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CorpusError::Request(format!("{} returned {status}", self.url)));
        }
        let text = response.text().await?;
        let pairs = parse_corpus(&text, &self.config)?;
        log::info!("corpus: loaded {} sentences from {}", pairs.len(), self.url);
        Ok(pairs)
    }
}

/// Pick the loader matching `config.source`: URLs are fetched, anything else
/// is treated as a file path.
pub fn loader_for(config: &CorpusConfig, client: reqwest::Client) -> Box<dyn CorpusLoader> {
    let source = config.source.trim();
    if source.starts_with("http://") || source.starts_with("https://") {
        Box::new(HttpCorpusLoader::new(client, source, config.clone()))
    } else {
        Box::new(FileCorpusLoader::new(source, config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn file_loader_reads_and_filters() {
        let dir = tempdir().expect("temp dir");
        let file = dir.path().join("leku_list.csv");
        std::fs::write(&file, "漢字,羅馬字\n雨,hoo7\n,missing\n").unwrap();

        let loader = FileCorpusLoader::new(&file, CorpusConfig::default());
        let pairs = loader.load().await.unwrap();

        assert_eq!(pairs, vec![SentencePair::new("雨", "hoo7")]);
    }

    #[tokio::test]
    async fn file_loader_missing_file_is_io_error() {
        let dir = tempdir().expect("temp dir");
        let loader = FileCorpusLoader::new(dir.path().join("nope.csv"), CorpusConfig::default());
        assert!(matches!(loader.load().await, Err(CorpusError::Io(_))));
    }

    #[tokio::test]
    async fn http_loader_fetches_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/TTS_leku_tester/leku_list.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("漢字,羅馬字\n水,tsui2\n"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/TTS_leku_tester/leku_list.csv", server.uri());
        let loader = HttpCorpusLoader::new(reqwest::Client::new(), url, CorpusConfig::default());
        let pairs = loader.load().await.unwrap();

        assert_eq!(pairs, vec![SentencePair::new("水", "tsui2")]);
    }

    #[tokio::test]
    async fn http_loader_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = HttpCorpusLoader::new(
            reqwest::Client::new(),
            format!("{}/missing.csv", server.uri()),
            CorpusConfig::default(),
        );
        assert!(matches!(loader.load().await, Err(CorpusError::Request(_))));
    }
}
