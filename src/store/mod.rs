//! Correction store: persisted 漢字 / 羅馬字 corrections.
//!
//! * [`CorrectionRecord`], [`NewCorrection`], [`CorrectionPatch`]: wire types.
//! * [`CorrectionStore`]: async trait (`Arc<dyn CorrectionStore>`).
//! * [`RestCorrectionStore`]: PostgREST-style HTTP implementation.

pub mod client;
pub mod record;

pub use client::{CorrectionStore, RestCorrectionStore};
pub use record::{CorrectionPatch, CorrectionRecord, NewCorrection, RecordId};

use thiserror::Error;

/// Errors raised by the correction store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No store URL has been configured.
    #[error("correction store is not configured (set LEKU_STORE_URL)")]
    NotConfigured,

    /// HTTP transport or connection error.
    #[error("correction store unreachable: {0}")]
    Transport(String),

    /// The store answered with an error status.
    #[error("correction store rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The store's answer could not be parsed.
    #[error("failed to parse correction store response: {0}")]
    Parse(String),

    /// The addressed record does not exist (anymore).
    #[error("correction record {0} not found")]
    NotFound(RecordId),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}
