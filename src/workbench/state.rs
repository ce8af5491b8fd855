//! Shared application state read by the UI every frame.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<AppState>>`: cheap to clone
//! and safe to share between the UI thread and runtime tasks.  Lock it for a
//! short critical section only; never hold the guard across `.await`.

use std::sync::{Arc, Mutex};

use crate::session::{Action, BusyTracker, EditSession};
use crate::store::CorrectionRecord;

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A user-visible notification shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Everything the UI renders.
#[derive(Debug, Default)]
pub struct AppState {
    pub session: EditSession,
    /// Newest first; replaced wholesale on every refresh.
    pub history: Vec<CorrectionRecord>,
    pub busy: BusyTracker,
    /// Latest notification, `None` until something happened.
    pub notice: Option<Notice>,
    /// Number of sentences available to draw from.
    pub corpus_len: usize,
}

impl AppState {
    pub fn new(corpus_len: usize) -> Self {
        Self {
            corpus_len,
            ..Self::default()
        }
    }
}

/// Thread-safe handle to [`AppState`].
pub type SharedState = Arc<Mutex<AppState>>;

/// Construct a new [`SharedState`].
pub fn new_shared_state(corpus_len: usize) -> SharedState {
    Arc::new(Mutex::new(AppState::new(corpus_len)))
}

// ---------------------------------------------------------------------------
// BusyGuard
// ---------------------------------------------------------------------------

/// Marks an action busy for as long as the guard lives.
///
/// Dropping the guard clears the mark on every exit path, including `?`
/// early returns and panics inside the action.
#[derive(Debug)]
pub struct BusyGuard {
    state: SharedState,
    action: Action,
}

impl BusyGuard {
    pub fn begin(state: &SharedState, action: Action) -> Self {
        if let Ok(mut st) = state.lock() {
            st.busy.begin(action);
        }
        Self::adopt(state, action)
    }

    /// Take over a mark already begun on `state` while it was locked.
    pub fn adopt(state: &SharedState, action: Action) -> Self {
        Self {
            state: Arc::clone(state),
            action,
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if let Ok(mut st) = self.state.lock() {
            st.busy.finish(self.action);
        }
    }
}
