//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//!
//! Store credentials can additionally be supplied through the environment
//! (`LEKU_STORE_URL`, `LEKU_STORE_KEY`) so they never have to be written into
//! `settings.toml`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::corpus::SentenceField;
use crate::synthesis::Backend;

/// Environment variable overriding [`StoreConfig::url`].
pub const ENV_STORE_URL: &str = "LEKU_STORE_URL";
/// Environment variable overriding [`StoreConfig::api_key`].
pub const ENV_STORE_KEY: &str = "LEKU_STORE_KEY";

// ---------------------------------------------------------------------------
// CorpusConfig
// ---------------------------------------------------------------------------

/// Where the sentence list lives and how its columns are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// File path, or an `http(s)://` URL fetched at startup.
    pub source: String,
    /// Field delimiter of the tabular file.
    pub delimiter: char,
    /// Header of the logographic (漢字) column.
    pub logographic_column: String,
    /// Header of the romanized (羅馬字) column.
    pub romanized_column: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            source: "leku_list.csv".into(),
            delimiter: ',',
            logographic_column: "漢字".into(),
            romanized_column: "羅馬字".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesis backends
// ---------------------------------------------------------------------------

/// Which written form a backend is sent when a play button is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpokenForm {
    /// The form shown in the column whose button was pressed.
    Column,
    Logographic,
    Romanized,
}

/// How backend A wraps its base64 audio payload.
///
/// The two observed server revisions differ: one answers
/// `{"result": "<base64>"}`, the other a bare base64 text body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InlineEncoding {
    /// Base64 string nested under a JSON field.
    JsonField { field: String },
    /// The whole response body is the base64 string.
    RawText,
}

impl Default for InlineEncoding {
    fn default() -> Self {
        Self::JsonField {
            field: "result".into(),
        }
    }
}

/// Backend A: answers with an inline base64 payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineBackendConfig {
    /// Endpoint receiving `{"tts_lang", "tts_data"}`.
    pub url: String,
    /// Which form the play buttons send.
    pub spoken_form: SpokenForm,
    /// Language tag used when playing the logographic form.
    pub logographic_language: String,
    /// Language tag used when playing the romanized form.
    pub romanized_language: String,
    /// MIME type of the decoded bytes (`audio/mp3`, `audio/wav`, ...).
    pub mime_type: String,
    pub encoding: InlineEncoding,
}

impl Default for InlineBackendConfig {
    fn default() -> Self {
        Self {
            url: "https://dev.taigiedu.com/backend/synthesize_speech".into(),
            spoken_form: SpokenForm::Romanized,
            logographic_language: "tb".into(),
            romanized_language: "tb".into(),
            mime_type: "audio/mp3".into(),
            encoding: InlineEncoding::default(),
        }
    }
}

/// Backend B: answers with a JSON object naming a retrievable audio file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceBackendConfig {
    /// Endpoint receiving `{"language", "text", "model_id"}`.
    pub url: String,
    pub spoken_form: SpokenForm,
    pub logographic_language: String,
    pub romanized_language: String,
    /// Synthesis model sent as `model_id`.
    pub model_id: String,
    /// JSON field of the response holding the relative audio path.
    pub path_field: String,
    /// Base address the relative path is appended to.
    pub resource_base: String,
}

impl Default for ReferenceBackendConfig {
    fn default() -> Self {
        Self {
            url: "http://140.116.245.147:30011/synthesize".into(),
            spoken_form: SpokenForm::Column,
            logographic_language: "taiwanese".into(),
            romanized_language: "tailuo".into(),
            model_id: "M10".into(),
            path_field: "audio_path".into(),
            resource_base: "http://140.116.245.147:30011".into(),
        }
    }
}

/// Raw-socket HTS synthesis server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtsBackendConfig {
    pub host: String,
    /// Fixed port overriding the per-language default.
    pub port: Option<u16>,
    pub spoken_form: SpokenForm,
    /// Shared token prepended to every request frame.
    pub token: String,
    /// Voice model (ignored for `chinese`, which always uses `M60`).
    pub model: String,
    pub logographic_language: String,
    pub romanized_language: String,
    /// MIME type of the returned audio stream.
    pub mime_type: String,
}

impl Default for HtsBackendConfig {
    fn default() -> Self {
        Self {
            host: "140.116.245.157".into(),
            port: None,
            spoken_form: SpokenForm::Column,
            token: "mi2stts".into(),
            model: "M10".into(),
            logographic_language: "taiwanese_sandhi".into(),
            romanized_language: "tailuo_sandhi".into(),
            mime_type: "audio/wav".into(),
        }
    }
}

/// Settings for every synthesis backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Backends offered as play buttons, in display order.
    pub backends: Vec<Backend>,
    pub inline: InlineBackendConfig,
    pub reference: ReferenceBackendConfig,
    pub hts: HtsBackendConfig,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            backends: vec![Backend::Inline, Backend::Reference],
            inline: InlineBackendConfig::default(),
            reference: ReferenceBackendConfig::default(),
            hts: HtsBackendConfig::default(),
        }
    }
}

impl SynthesisConfig {
    /// Form of the sentence `backend` speaks when the `column` play button
    /// is pressed.
    pub fn spoken_field(&self, backend: Backend, column: SentenceField) -> SentenceField {
        let form = match backend {
            Backend::Inline => self.inline.spoken_form,
            Backend::Reference => self.reference.spoken_form,
            Backend::Hts => self.hts.spoken_form,
        };
        match form {
            SpokenForm::Column => column,
            SpokenForm::Logographic => SentenceField::Logographic,
            SpokenForm::Romanized => SentenceField::Romanized,
        }
    }

    /// Language tag sent to `backend` when playing `field`.
    pub fn language_tag(&self, backend: Backend, field: SentenceField) -> &str {
        let (logographic, romanized) = match backend {
            Backend::Inline => (
                &self.inline.logographic_language,
                &self.inline.romanized_language,
            ),
            Backend::Reference => (
                &self.reference.logographic_language,
                &self.reference.romanized_language,
            ),
            Backend::Hts => (&self.hts.logographic_language, &self.hts.romanized_language),
        };
        match field {
            SentenceField::Logographic => logographic,
            SentenceField::Romanized => romanized,
        }
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Connection settings for the hosted correction store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Anonymous API key: `None` until configured.
    pub api_key: Option<String>,
    /// Table holding the correction records.
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            table: "tts_corrections".into(),
        }
    }
}

impl StoreConfig {
    /// `true` once both a URL and a non-empty key are present.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// External player used for fire-and-forget playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Executable name or path.
    pub command: String,
    /// Arguments placed before the file path / URL.
    pub args: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            command: "ffplay".into(),
            args: vec![
                "-nodisp".into(),
                "-autoexit".into(),
                "-loglevel".into(),
                "quiet".into(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Initial inner size `(width, height)` in points.
    pub window_size: (f32, f32),
    /// Font file with CJK coverage.  egui's bundled fonts have no Han
    /// glyphs, so the 漢字 column renders as boxes without one.
    pub cjk_font: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (1100.0, 720.0),
            cjk_font: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use leku_tester::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let mut config = AppConfig::load().unwrap();
/// config.apply_env_overrides();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub corpus: CorpusConfig,
    pub synthesis: SynthesisConfig,
    pub store: StoreConfig,
    pub playback: PlaybackConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overlay store credentials from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|name| std::env::var(name).ok());
    }

    /// Overlay store credentials using `lookup` as the variable source.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// wipe a configured credential.
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_STORE_URL).filter(|v| !v.trim().is_empty()) {
            self.store.url = url;
        }
        if let Some(key) = lookup(ENV_STORE_KEY).filter(|v| !v.trim().is_empty()) {
            self.store.api_key = Some(key);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
