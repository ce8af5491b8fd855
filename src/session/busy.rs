//! Per-action busy indication.

use std::collections::HashMap;

use crate::corpus::SentenceField;
use crate::synthesis::Backend;

/// A user-triggerable action that makes a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Play { field: SentenceField, backend: Backend },
    Save,
    Delete,
    RefreshHistory,
}

/// In-flight count per action.
///
/// Counting (rather than a flag) keeps the indicator on while a second call
/// of the same action is still running after the first one finished.
#[derive(Debug, Clone, Default)]
pub struct BusyTracker {
    in_flight: HashMap<Action, usize>,
}

impl BusyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, action: Action) {
        *self.in_flight.entry(action).or_insert(0) += 1;
    }

    pub fn finish(&mut self, action: Action) {
        if let Some(count) = self.in_flight.get_mut(&action) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(&action);
            }
        }
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.in_flight.contains_key(&action)
    }

    pub fn any_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }
}
