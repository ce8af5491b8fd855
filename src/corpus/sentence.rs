//! Sentence pair value type.

use serde::{Deserialize, Serialize};

/// One corpus entry: the same sentence written in 漢字 and in 羅馬字.
///
/// Both fields are non-empty for every pair produced by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SentencePair {
    pub logographic: String,
    pub romanized: String,
}

impl SentencePair {
    pub fn new(logographic: impl Into<String>, romanized: impl Into<String>) -> Self {
        Self {
            logographic: logographic.into(),
            romanized: romanized.into(),
        }
    }

    /// The text of one form.
    pub fn form(&self, field: SentenceField) -> &str {
        match field {
            SentenceField::Logographic => &self.logographic,
            SentenceField::Romanized => &self.romanized,
        }
    }
}

/// Selects one of the two written forms of a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceField {
    Logographic,
    Romanized,
}

impl SentenceField {
    pub const ALL: [SentenceField; 2] = [SentenceField::Logographic, SentenceField::Romanized];

    /// Column heading shown in the UI.
    pub fn label(self) -> &'static str {
        match self {
            SentenceField::Logographic => "漢字",
            SentenceField::Romanized => "羅馬字",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_selects_field() {
        let pair = SentencePair::new("雨", "hoo7");
        assert_eq!(pair.form(SentenceField::Logographic), "雨");
        assert_eq!(pair.form(SentenceField::Romanized), "hoo7");
    }

    #[test]
    fn labels() {
        assert_eq!(SentenceField::Logographic.label(), "漢字");
        assert_eq!(SentenceField::Romanized.label(), "羅馬字");
    }
}
