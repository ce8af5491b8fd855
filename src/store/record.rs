//! Correction record types as they travel to and from the store.
//!
//! Field names match the columns of the `tts_corrections` table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::corpus::SentencePair;

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// Store-assigned record identifier.
///
/// Opaque to the client.  The store may send it as a JSON number (serial
/// column) or a string (uuid column); both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "WireId", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

impl From<WireId> for RecordId {
    fn from(wire: WireId) -> Self {
        match wire {
            WireId::Number(n) => RecordId(n.to_string()),
            WireId::Text(s) => RecordId(s),
        }
    }
}

// ---------------------------------------------------------------------------
// CorrectionRecord
// ---------------------------------------------------------------------------

/// One persisted correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub id: RecordId,
    pub original_hanji: String,
    pub original_lomaji: String,
    #[serde(default)]
    pub hanji_correction: Option<String>,
    #[serde(default)]
    pub lomaji_correction: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CorrectionRecord {
    /// The sentence this correction was made against.
    pub fn original(&self) -> SentencePair {
        SentencePair::new(self.original_hanji.clone(), self.original_lomaji.clone())
    }

    /// Non-empty logographic correction, if any.
    pub fn hanji(&self) -> Option<&str> {
        self.hanji_correction.as_deref().filter(|s| !s.is_empty())
    }

    /// Non-empty romanized correction, if any.
    pub fn lomaji(&self) -> Option<&str> {
        self.lomaji_correction.as_deref().filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Insert payload; `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCorrection {
    pub original_hanji: String,
    pub original_lomaji: String,
    pub hanji_correction: String,
    pub lomaji_correction: String,
}

impl NewCorrection {
    pub fn new(
        original: &SentencePair,
        hanji_correction: impl Into<String>,
        lomaji_correction: impl Into<String>,
    ) -> Self {
        Self {
            original_hanji: original.logographic.clone(),
            original_lomaji: original.romanized.clone(),
            hanji_correction: hanji_correction.into(),
            lomaji_correction: lomaji_correction.into(),
        }
    }
}

/// Update payload: the two mutable columns only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionPatch {
    pub hanji_correction: String,
    pub lomaji_correction: String,
}
