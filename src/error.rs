use thiserror::Error;

/// Failures from the pronunciation core. Anything involving files is reported through `anyhow`
/// further up, these are the ones callers may want to match on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexiconError {
    #[error(
        "alignment mismatch for '{sentence}': tokens cover {characters} characters but {phones} phonemes were produced"
    )]
    Alignment {
        sentence: String,
        characters: usize,
        phones: usize,
    },
    #[error("exception substitution for '{key}' produces '{value}' which is itself rewritten by the table")]
    NonIdempotentExceptions { key: String, value: String },
    #[error("exception tables can't contain an empty key")]
    EmptyExceptionKey,
}

impl LexiconError {
    pub(crate) fn alignment(sentence: impl Into<String>, characters: usize, phones: usize) -> Self {
        Self::Alignment {
            sentence: sentence.into(),
            characters,
            phones,
        }
    }
}
