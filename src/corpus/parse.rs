//! Delimited-text parsing for the sentence list.
//!
//! Tokenizing is left to the `csv` crate: a header row, quoted fields with
//! `""` escapes (which may span lines), LF or CRLF line endings and blank
//! lines.  A leading UTF-8 BOM is stripped first.

use crate::config::CorpusConfig;
use crate::corpus::{CorpusError, SentencePair};

/// Parse the corpus text into sentence pairs.
///
/// Rows where either configured column is missing or blank are dropped.
///
/// # Errors
///
/// * [`CorpusError::MissingColumn`] when the header row lacks one of the
///   configured column names (or there is no header at all).
/// * [`CorpusError::Delimiter`] for a non-ASCII delimiter.
/// * [`CorpusError::Malformed`] when the text cannot be tokenized.
pub fn parse_corpus(text: &str, config: &CorpusConfig) -> Result<Vec<SentencePair>, CorpusError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = u8::try_from(config.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(CorpusError::Delimiter(config.delimiter))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header = reader.headers()?.clone();
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| CorpusError::MissingColumn(name.to_string()))
    };
    let logographic_idx = column(&config.logographic_column)?;
    let romanized_idx = column(&config.romanized_column)?;

    let mut pairs = Vec::new();
    let mut dropped = 0usize;

    for row in reader.records() {
        let row = row?;
        let logographic = row.get(logographic_idx).filter(|v| !v.trim().is_empty());
        let romanized = row.get(romanized_idx).filter(|v| !v.trim().is_empty());

        match (logographic, romanized) {
            (Some(l), Some(r)) => pairs.push(SentencePair::new(l, r)),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("corpus: dropped {dropped} incomplete rows");
    }

    Ok(pairs)
}
