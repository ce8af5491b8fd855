//! Workbench: wires session state, synthesis, playback and the store.
//!
//! # Flow
//!
//! ```text
//! UI ──WorkbenchCommand──▶ Workbench::apply_local (UI thread)
//!                            ├─ Draw / SelectHistory / EditDraft → applied
//!                            ├─ Save → planned, becomes CommitSave
//!                            └─ Play / CommitSave / Delete / RefreshHistory
//!                                 → Workbench::run, one task per command
//!
//! Play    : session text ─▶ SynthesisGateway ─▶ AudioDecoder ─▶ AudioPlayer
//! Save    : EditSession::plan_save (at click) ─▶ CorrectionStore insert|update ─▶ refresh
//! Delete  : CorrectionStore::delete ─▶ refresh
//! ```
//!
//! Every remote action holds a [`BusyGuard`] for its duration and reports
//! failure as an error [`Notice`]; no failure changes the session or the
//! history.

pub mod actions;
pub mod runner;
pub mod state;

pub use actions::{PendingSave, Workbench};
pub use runner::WorkbenchCommand;
pub use state::{new_shared_state, AppState, BusyGuard, Notice, NoticeLevel, SharedState};

use thiserror::Error;

use crate::session::SessionError;
use crate::store::{RecordId, StoreError};
use crate::synthesis::{DecodeError, TransportError};

/// Any failure of a workbench action.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The selected history item is no longer in the list.
    #[error("history item {0} is no longer listed")]
    UnknownRecord(RecordId),
}
