//! The pronunciation lexicon maps each word seen in the corpus to its phones. Kaldi wants this as
//! `lexicon.txt` along with the set of phones used, which is derived from the lexicon rather than
//! stored so the two can't disagree.
//!
//! The same word can come out of `G2pModel` with different phones in different sentences. Which
//! behaviour you want here depends on whether you trust the context dependent reading, so it's
//! controlled by the `CollisionPolicy`.
use crate::config::CollisionPolicy;
use crate::error::LexiconError;
use crate::g2p::G2pModel;
use crate::phonemes::resplit;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, prelude::*};
use tracing::warn;

/// Silence and unknown word entries that start every lexicon.
pub const SILENCE_ENTRIES: &[(&str, &str)] = &[("!SIL", "sil"), ("<UNK>", "spn")];
pub const SILENCE_PHONES: &[&str] = &["sil", "spn"];
pub const OPTIONAL_SILENCE: &str = "sil";

/// A word seen with a different pronunciation than the one kept.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Conflict {
    pub word: String,
    pub kept: String,
    pub rejected: String,
}

#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    policy: CollisionPolicy,
    /// Every word maps to one or more pronunciations depending on the policy
    entries: BTreeMap<String, BTreeSet<String>>,
    conflicts: Vec<Conflict>,
}

impl Lexicon {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Adds a pronunciation, returns true if the lexicon changed.
    pub fn insert(&mut self, word: &str, phones: &str) -> bool {
        let pronunciations = self.entries.entry(word.to_string()).or_default();
        match self.policy {
            CollisionPolicy::KeepAll => pronunciations.insert(phones.to_string()),
            CollisionPolicy::ByWord => match pronunciations.iter().next().cloned() {
                None => pronunciations.insert(phones.to_string()),
                Some(kept) if kept == phones => false,
                Some(kept) => {
                    warn!(
                        "'{}' already pronounced '{}', ignoring '{}'",
                        word, kept, phones
                    );
                    let conflict = Conflict {
                        word: word.to_string(),
                        kept,
                        rejected: phones.to_string(),
                    };
                    if !self.conflicts.contains(&conflict) {
                        self.conflicts.push(conflict);
                    }
                    false
                }
            },
        }
    }

    /// Number of `(word, phones)` entries
    pub fn len(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct words
    pub fn words(&self) -> usize {
        self.entries.len()
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    pub fn get_pronunciations(&self, word: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(word)
    }

    /// Conflicts found under `CollisionPolicy::ByWord`, always empty otherwise
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// All `(word, phones)` entries sorted by word then phones.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(word, phones)| phones.iter().map(move |p| (word.as_str(), p.as_str())))
    }

    /// Every distinct phone used by the lexicon.
    pub fn phone_set(&self) -> BTreeSet<String> {
        self.iter()
            .flat_map(|(_, phones)| phones.split_whitespace())
            .map(|phone| phone.to_string())
            .collect()
    }

    /// Pulls in the pronunciations of every sentence. Each sentence's tokens are aligned against
    /// a single romanisation of the whole sentence, so a failed alignment stops the build with
    /// the sentence that caused it.
    pub fn extend_from_sentences<S: AsRef<str>>(
        &mut self,
        sentences: &[Vec<S>],
        g2p: &G2pModel,
    ) -> Result<(), LexiconError> {
        for tokens in sentences.iter().filter(|s| !s.is_empty()) {
            let phones = g2p.sentence_to_aligned_phones(tokens)?;
            for (word, word_phones) in tokens.iter().zip(phones.iter()) {
                self.insert(word.as_ref(), &resplit(word_phones, g2p.config()));
            }
        }
        Ok(())
    }

    /// Adds a word outside of any sentence context.
    pub fn insert_word(&mut self, word: &str, g2p: &G2pModel) -> Result<bool, LexiconError> {
        let phones = resplit(&g2p.word_to_phones(word)?, g2p.config());
        Ok(self.insert(word, &phones))
    }

    /// Writes `lexicon.txt`, silence entries first then the words in sorted order.
    pub fn write(&self, mut writer: impl Write) -> io::Result<()> {
        for (word, phones) in SILENCE_ENTRIES {
            writeln!(writer, "{} {}", word, phones)?;
        }
        for (word, phones) in self.iter() {
            writeln!(writer, "{} {}", word, phones)?;
        }
        writer.flush()
    }

    /// Writes `nonsilence_phones.txt`, one phone per line.
    pub fn write_phones(&self, mut writer: impl Write) -> io::Result<()> {
        for phone in self.phone_set() {
            writeln!(writer, "{}", phone)?;
        }
        writer.flush()
    }
}

/// Builds the lexicon and phone set for a corpus of segmented sentences.
pub fn build_lexicon<S: AsRef<str>>(
    sentences: &[Vec<S>],
    g2p: &G2pModel,
) -> Result<(Lexicon, BTreeSet<String>), LexiconError> {
    let mut lexicon = Lexicon::new(g2p.config().collisions);
    lexicon.extend_from_sentences(sentences, g2p)?;
    let phones = lexicon.phone_set();
    Ok((lexicon, phones))
}
