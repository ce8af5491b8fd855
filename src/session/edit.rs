//! Edit session: which sentence is active and how a save is routed.
//!
//! ```text
//! any phase ──draw──────────────▶ DraftingNew
//! any phase ──select_history────▶ DraftingExisting(id)
//! DraftingExisting ──complete_save──▶ DraftingNew   (same sentence)
//! edit_draft never changes the phase
//! ```
//!
//! The phase is derived from the session fields, never stored.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::corpus::{SentenceField, SentencePair};
use crate::store::{CorrectionPatch, CorrectionRecord, NewCorrection, RecordId};

/// Session-level rejections; none of them touches the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the sentence list is empty")]
    EmptyCorpus,

    #[error("請先抽選句子")]
    NoActiveSentence,

    #[error("both corrections are empty")]
    NothingToSave,
}

/// Where the session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing drawn or selected yet.
    Fresh,
    /// A drawn sentence; saving creates a record.
    DraftingNew,
    /// A history record under edit; saving updates it.
    DraftingExisting(RecordId),
}

/// The store call a save resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveAction {
    Insert(NewCorrection),
    Update { id: RecordId, patch: CorrectionPatch },
}

/// Client-side edit state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    active: Option<SentencePair>,
    logographic_draft: String,
    romanized_draft: String,
    /// `Some` iff the drafts were loaded from a history record.
    editing: Option<RecordId>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.active, &self.editing) {
            (_, Some(id)) => SessionPhase::DraftingExisting(id.clone()),
            (Some(_), None) => SessionPhase::DraftingNew,
            (None, None) => SessionPhase::Fresh,
        }
    }

    pub fn active(&self) -> Option<&SentencePair> {
        self.active.as_ref()
    }

    pub fn editing(&self) -> Option<&RecordId> {
        self.editing.as_ref()
    }

    pub fn draft(&self, field: SentenceField) -> &str {
        match field {
            SentenceField::Logographic => &self.logographic_draft,
            SentenceField::Romanized => &self.romanized_draft,
        }
    }

    fn draft_mut(&mut self, field: SentenceField) -> &mut String {
        match field {
            SentenceField::Logographic => &mut self.logographic_draft,
            SentenceField::Romanized => &mut self.romanized_draft,
        }
    }

    /// `true` when at least one draft holds text.
    pub fn has_draft(&self) -> bool {
        !self.logographic_draft.is_empty() || !self.romanized_draft.is_empty()
    }

    /// Pick a sentence uniformly at random and start a fresh draft for it.
    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        corpus: &[SentencePair],
        rng: &mut R,
    ) -> Result<SentencePair, SessionError> {
        let pair = corpus.choose(rng).ok_or(SessionError::EmptyCorpus)?.clone();
        self.active = Some(pair.clone());
        self.clear_drafts();
        Ok(pair)
    }

    /// Load a history record for editing.
    pub fn select_history(&mut self, record: &CorrectionRecord) {
        self.active = Some(record.original());
        self.logographic_draft = record.hanji_correction.clone().unwrap_or_default();
        self.romanized_draft = record.lomaji_correction.clone().unwrap_or_default();
        self.editing = Some(record.id.clone());
    }

    /// Replace one draft.
    pub fn edit_draft(&mut self, field: SentenceField, text: impl Into<String>) {
        *self.draft_mut(field) = text.into();
    }

    /// Decide which store call a save makes.
    pub fn plan_save(&self) -> Result<SaveAction, SessionError> {
        if !self.has_draft() {
            return Err(SessionError::NothingToSave);
        }
        let active = self.active.as_ref().ok_or(SessionError::NoActiveSentence)?;
        Ok(match &self.editing {
            None => SaveAction::Insert(NewCorrection::new(
                active,
                self.logographic_draft.clone(),
                self.romanized_draft.clone(),
            )),
            Some(id) => SaveAction::Update {
                id: id.clone(),
                patch: CorrectionPatch {
                    hanji_correction: self.logographic_draft.clone(),
                    lomaji_correction: self.romanized_draft.clone(),
                },
            },
        })
    }

    /// The store accepted the save; keep the sentence and start over.
    pub fn complete_save(&mut self) {
        self.clear_drafts();
    }

    fn clear_drafts(&mut self) {
        self.logographic_draft.clear();
        self.romanized_draft.clear();
        self.editing = None;
    }
}
