//! Taiwanese TTS correction workbench.
//!
//! Draws sentence pairs (漢字 / 羅馬字) from a corpus, plays them through
//! remote synthesis backends and records operator corrections in a hosted
//! store.

pub mod app;
pub mod config;
pub mod corpus;
pub mod playback;
pub mod session;
pub mod store;
pub mod synthesis;
pub mod workbench;
