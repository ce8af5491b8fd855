//! Configuration module for the correction workbench.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform directories, and TOML loading via
//! `AppConfig::load`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, CorpusConfig, HtsBackendConfig, InlineBackendConfig, InlineEncoding,
    PlaybackConfig, ReferenceBackendConfig, SpokenForm, StoreConfig, SynthesisConfig, UiConfig,
    ENV_STORE_KEY, ENV_STORE_URL,
};
