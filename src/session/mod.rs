//! Client-side session state: the edit context and busy indication.

pub mod busy;
pub mod edit;

pub use busy::{Action, BusyTracker};
pub use edit::{EditSession, SaveAction, SessionError, SessionPhase};
