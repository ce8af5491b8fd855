//! Sentence corpus: the static list of 漢字 / 羅馬字 pairs to evaluate.
//!
//! * [`SentencePair`] / [`SentenceField`]: the value types.
//! * [`parse_corpus`]: delimited text → pairs, dropping incomplete rows.
//! * [`CorpusLoader`]: async trait with file and HTTP implementations.

pub mod loader;
pub mod parse;
pub mod sentence;

pub use loader::{loader_for, CorpusLoader, FileCorpusLoader, HttpCorpusLoader};
pub use parse::parse_corpus;
pub use sentence::{SentenceField, SentencePair};

use thiserror::Error;

/// Errors raised while loading the corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus file could not be read.
    #[error("cannot read corpus: {0}")]
    Io(#[from] std::io::Error),

    /// The corpus URL could not be fetched.
    #[error("cannot fetch corpus: {0}")]
    Request(String),

    /// The header row lacks a configured column.
    #[error("corpus header has no \"{0}\" column")]
    MissingColumn(String),

    /// The configured delimiter is not a single ASCII character.
    #[error("unsupported corpus delimiter {0:?}")]
    Delimiter(char),

    /// The text could not be split into records.
    #[error("malformed corpus: {0}")]
    Malformed(String),
}

impl From<csv::Error> for CorpusError {
    fn from(e: csv::Error) -> Self {
        CorpusError::Malformed(e.to_string())
    }
}

impl From<reqwest::Error> for CorpusError {
    fn from(e: reqwest::Error) -> Self {
        CorpusError::Request(e.to_string())
    }
}
