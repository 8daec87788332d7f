//! Does some analytics on the prepared data. Mostly useful for spotting characters the romaniser
//! didn't know (which then need adding to the exception table) and phones that barely appear.
use crate::lexicon::Lexicon;
use crate::text_normaliser::is_han;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ConflictStat {
    pub word: String,
    pub kept: String,
    pub rejected: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analytics {
    /// Number of lexicon entries each phone appears in
    pub phones: BTreeMap<String, usize>,
    /// Characters left without a pronunciation, with the number of lexicon entries they're in
    pub unknown_characters: BTreeMap<String, usize>,
    /// Words per sentence
    pub sentence_lengths: BTreeMap<usize, usize>,
    pub lexicon_entries: usize,
    pub lexicon_words: usize,
    /// Sentences dropped for containing latin letters
    pub excluded_sentences: usize,
    /// Metadata rows that failed to parse
    pub rejected_rows: usize,
    pub conflicts: Vec<ConflictStat>,
}

#[derive(Debug, Default)]
pub struct AnalyticsGenerator {
    sentence_lengths: BTreeMap<usize, usize>,
    excluded_sentences: usize,
    rejected_rows: usize,
}

impl AnalyticsGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sentence<S: AsRef<str>>(&mut self, words: &[S]) {
        *self.sentence_lengths.entry(words.len()).or_default() += 1;
        if words.len() > 50 {
            info!(
                "Very long sentence found: '{}'",
                words.iter().map(|w| w.as_ref()).collect::<String>()
            );
        }
    }

    pub fn push_excluded(&mut self, count: usize) {
        self.excluded_sentences += count;
    }

    pub fn push_rejected(&mut self, count: usize) {
        self.rejected_rows += count;
    }

    pub fn generate_report(&self, lexicon: &Lexicon) -> Analytics {
        let mut phones = BTreeMap::new();
        let mut unknown_characters = BTreeMap::new();
        for (_, pronunciation) in lexicon.iter() {
            for phone in pronunciation.split_whitespace() {
                *phones.entry(phone.to_string()).or_insert(0) += 1;
            }
            for c in pronunciation.chars().filter(|c| is_han(*c)) {
                *unknown_characters.entry(c.to_string()).or_insert(0) += 1;
            }
        }

        let conflicts = lexicon
            .conflicts()
            .iter()
            .map(|c| ConflictStat {
                word: c.word.clone(),
                kept: c.kept.clone(),
                rejected: c.rejected.clone(),
            })
            .collect();

        Analytics {
            phones,
            unknown_characters,
            sentence_lengths: self.sentence_lengths.clone(),
            lexicon_entries: lexicon.len(),
            lexicon_words: lexicon.words(),
            excluded_sentences: self.excluded_sentences,
            rejected_rows: self.rejected_rows,
            conflicts,
        }
    }
}
