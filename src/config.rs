//! Configuration shared by the pronunciation core. Nothing in here is global, a `PhonemeConfig`
//! and an `Exceptions` table get built once at startup and are passed by reference into every
//! call that needs them.
//!
//! The exception tables exist because the romaniser gets some characters wrong, or hands back
//! things that aren't zhuyin at all. These were found by looking at the generated lexicons so
//! they're expected to grow, hence being loadable from a JSON file and mergeable over the
//! built-in defaults.
use crate::error::LexiconError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// What to do when the same word turns up with two different pronunciations.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// The lexicon is a set of `(word, phones)` pairs so every distinct pronunciation is kept.
    /// Context dependent readings survive this way.
    #[default]
    KeepAll,
    /// One pronunciation per word, the first one seen wins and later conflicts are logged.
    ByWord,
}

impl std::str::FromStr for CollisionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep-all" => Ok(Self::KeepAll),
            "by-word" => Ok(Self::ByWord),
            _ => anyhow::bail!("Invalid collision policy: {} (expected keep-all or by-word)", s),
        }
    }
}

/// Settings controlling how pronunciation clusters turn into phoneme strings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PhonemeConfig {
    /// Glue the tone marker onto the final phone of each syllable
    pub use_tone: bool,
    /// Placed between the phones of one character
    pub separator: String,
    pub collisions: CollisionPolicy,
}

impl Default for PhonemeConfig {
    fn default() -> Self {
        Self {
            use_tone: true,
            separator: " ".to_string(),
            collisions: CollisionPolicy::default(),
        }
    }
}

/// A lookup with one variant for toned output and one for toneless output.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ToneTable {
    #[serde(default)]
    pub toned: BTreeMap<String, String>,
    #[serde(default)]
    pub toneless: BTreeMap<String, String>,
}

impl ToneTable {
    pub fn variant(&self, use_tone: bool) -> &BTreeMap<String, String> {
        if use_tone {
            &self.toned
        } else {
            &self.toneless
        }
    }

    fn merge(&mut self, other: ToneTable) {
        self.toned.extend(other.toned);
        self.toneless.extend(other.toneless);
    }

    fn from_pairs(toned: &[(&str, &str)], toneless: &[(&str, &str)]) -> Self {
        let collect = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self {
            toned: collect(toned),
            toneless: collect(toneless),
        }
    }
}

/// Hand curated fixes for defects in the transcripts and the romaniser output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Exceptions {
    /// Rewrites applied to transcripts before segmentation. Mostly simplified or variant forms
    /// the segmentation dictionary doesn't know.
    #[serde(default)]
    pub character_fixes: BTreeMap<String, String>,
    /// Words whose pronunciation is fixed outright, the romaniser is never consulted for them
    #[serde(default)]
    pub overrides: ToneTable,
    /// Substring replacements on generated phoneme strings
    #[serde(default)]
    pub substitutions: ToneTable,
}

impl Default for Exceptions {
    fn default() -> Self {
        let character_fixes = [
            ("内", "內"),
            ("爲", "為"),
            ("柺", "拐"),
            ("庄", "莊"),
            ("麽", "麼"),
            ("污", "汙"),
            ("値", "值"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        // The romaniser sometimes emits the CJK character for one instead of the bopomofo ㄧ
        let substitutions = ToneTable::from_pairs(
            &[
                ("一", "ㄧ"),
                ("勳", "ㄒ ㄩ ㄣ-"),
                ("艷", "ㄧ ㄢˋ"),
                ("曬", "ㄕ ㄞˋ"),
            ],
            &[
                ("一", "ㄧ"),
                ("勳", "ㄒ ㄩ ㄣ"),
                ("艷", "ㄧ ㄢ"),
                ("曬", "ㄕ ㄞ"),
            ],
        );

        let overrides = ToneTable::from_pairs(&[("曬", "ㄕ ㄞˋ")], &[("曬", "ㄕ ㄞ")]);

        Self {
            character_fixes,
            overrides,
            substitutions,
        }
    }
}

impl Exceptions {
    /// Tables with nothing in them, mostly useful for tests and for users who want to start from
    /// a clean slate.
    pub fn empty() -> Self {
        Self {
            character_fixes: BTreeMap::new(),
            overrides: ToneTable::default(),
            substitutions: ToneTable::default(),
        }
    }

    /// Loads a JSON exceptions file. Missing sections are treated as empty.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Unable to read exceptions file {}", path.display()))?;
        let exceptions: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid exceptions file {}", path.display()))?;
        exceptions.validate()?;
        Ok(exceptions)
    }

    /// Merge another table over this one, entries in `other` replace ours when the keys match.
    /// Lets a user file extend the built-in defaults without restating them.
    pub fn merge(&mut self, other: Exceptions) -> Result<(), LexiconError> {
        self.character_fixes.extend(other.character_fixes);
        self.overrides.merge(other.overrides);
        self.substitutions.merge(other.substitutions);
        self.validate()
    }

    /// Substitutions must be idempotent, so no replacement may contain a key of the same
    /// variant. Empty keys are rejected for the same reason. Replacements can also build a key
    /// out of the text around them, so every key and value on its own and next to each key has
    /// to settle within `MAX_FIX_PASSES` passes of the table.
    pub fn validate(&self) -> Result<(), LexiconError> {
        for table in [&self.substitutions.toned, &self.substitutions.toneless] {
            for (key, value) in table.iter() {
                if key.is_empty() {
                    return Err(LexiconError::EmptyExceptionKey);
                }
                if table.keys().any(|k| value.contains(k.as_str())) {
                    return Err(LexiconError::NonIdempotentExceptions {
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
            }
            for (key, value) in table.iter() {
                for other in table.keys() {
                    let candidates = [
                        key.clone(),
                        format!("{}{}", key, other),
                        format!("{}{}", other, key),
                        format!("{}{}", value, other),
                        format!("{}{}", other, value),
                    ];
                    if candidates.iter().any(|c| settle(table, c).is_none()) {
                        return Err(LexiconError::NonIdempotentExceptions {
                            key: key.clone(),
                            value: value.clone(),
                        });
                    }
                }
            }
        }
        if self.character_fixes.keys().any(|k| k.is_empty()) {
            return Err(LexiconError::EmptyExceptionKey);
        }
        Ok(())
    }

    /// Looks up a whole-word override.
    pub fn override_for(&self, word: &str, use_tone: bool) -> Option<&str> {
        self.overrides.variant(use_tone).get(word).map(|s| s.as_str())
    }

    /// Applies the substitution table to a phoneme string, repeating until nothing changes so
    /// running it twice gives the same result as running it once.
    pub fn fix_phones(&self, phones: &str, use_tone: bool) -> String {
        let table = self.substitutions.variant(use_tone);
        match settle(table, phones) {
            Some(fixed) => fixed,
            None => {
                warn!("Substitutions on '{}' never settled", phones);
                let mut fixed = phones.to_string();
                for _ in 0..MAX_FIX_PASSES {
                    fixed = substitute(table, &fixed);
                }
                fixed
            }
        }
    }
}

/// Upper bound on passes of the substitution table over one phoneme string.
pub const MAX_FIX_PASSES: usize = 8;

fn substitute(table: &BTreeMap<String, String>, phones: &str) -> String {
    let mut fixed = phones.to_string();
    for (from, to) in table {
        if fixed.contains(from.as_str()) {
            debug!("Fixing '{}' -> '{}' in '{}'", from, to, phones);
            fixed = fixed.replace(from.as_str(), to);
        }
    }
    fixed
}

/// Runs the table until the string stops changing, `None` if it's still changing after
/// `MAX_FIX_PASSES` passes.
fn settle(table: &BTreeMap<String, String>, phones: &str) -> Option<String> {
    let mut fixed = phones.to_string();
    for _ in 0..MAX_FIX_PASSES {
        let next = substitute(table, &fixed);
        if next == fixed {
            return Some(fixed);
        }
        fixed = next;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_are_valid() {
        let exceptions = Exceptions::default();
        exceptions.validate().unwrap();
        assert_eq!(exceptions.override_for("曬", true), Some("ㄕ ㄞˋ"));
        assert_eq!(exceptions.override_for("曬", false), Some("ㄕ ㄞ"));
        assert_eq!(exceptions.override_for("曬曬", true), None);
    }

    #[test]
    fn fix_phones_substitutes() {
        let exceptions = Exceptions::default();
        assert_eq!(exceptions.fix_phones("一 ㄢˋ", true), "ㄧ ㄢˋ");
        assert_eq!(exceptions.fix_phones("ㄒ ㄩ ㄣ- 勳", true), "ㄒ ㄩ ㄣ- ㄒ ㄩ ㄣ-");
        assert_eq!(exceptions.fix_phones("艷", false), "ㄧ ㄢ");
        assert_eq!(exceptions.fix_phones("ㄋ ㄧˇ", true), "ㄋ ㄧˇ");
    }

    #[test]
    fn fix_phones_is_idempotent() {
        let exceptions = Exceptions::default();
        for input in ["一", "勳 艷", "ㄏ ㄠˇ 曬", "一勳艷曬", ""] {
            for use_tone in [true, false] {
                let once = exceptions.fix_phones(input, use_tone);
                let twice = exceptions.fix_phones(&once, use_tone);
                assert_eq!(once, twice, "{} use_tone={}", input, use_tone);
            }
        }
    }

    #[test]
    fn substitutions_that_form_keys() {
        let mut exceptions = Exceptions::empty();
        exceptions
            .substitutions
            .toned
            .insert("ㄅㄅ".to_string(), "ㄅ".to_string());
        exceptions.validate().unwrap();
        let once = exceptions.fix_phones("ㄅㄅㄅ", true);
        assert_eq!(once, "ㄅ");
        assert_eq!(exceptions.fix_phones(&once, true), once);

        // A later key rebuilding an earlier one
        let mut exceptions = Exceptions::empty();
        for (k, v) in [("ab", "z"), ("c", "a")] {
            exceptions
                .substitutions
                .toneless
                .insert(k.to_string(), v.to_string());
        }
        exceptions.validate().unwrap();
        let once = exceptions.fix_phones("cb", false);
        assert_eq!(once, "z");
        assert_eq!(exceptions.fix_phones(&once, false), once);
    }

    #[test]
    fn reject_non_idempotent() {
        let mut exceptions = Exceptions::empty();
        exceptions
            .substitutions
            .toned
            .insert("A".to_string(), "xAx".to_string());
        assert!(matches!(
            exceptions.validate(),
            Err(LexiconError::NonIdempotentExceptions { .. })
        ));

        let mut exceptions = Exceptions::empty();
        exceptions
            .substitutions
            .toneless
            .insert(String::new(), "x".to_string());
        assert_eq!(exceptions.validate(), Err(LexiconError::EmptyExceptionKey));
    }

    #[test]
    fn merge_user_table() {
        let user: Exceptions = serde_json::from_str(
            r#"{"substitutions": {"toned": {"艷": "ㄧ ㄢ-"}}, "character_fixes": {"着": "著"}}"#,
        )
        .unwrap();
        let mut exceptions = Exceptions::default();
        exceptions.merge(user).unwrap();

        assert_eq!(exceptions.fix_phones("艷", true), "ㄧ ㄢ-");
        // Toneless variant untouched
        assert_eq!(exceptions.fix_phones("艷", false), "ㄧ ㄢ");
        assert_eq!(exceptions.character_fixes.get("着").unwrap(), "著");
        assert_eq!(exceptions.character_fixes.get("内").unwrap(), "內");
    }

    #[test]
    fn open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exceptions.json");
        fs::write(&path, r#"{"overrides": {"toned": {"的": "ㄉ ㄜ˙"}}}"#).unwrap();
        let exceptions = Exceptions::open(&path).unwrap();
        assert_eq!(exceptions.override_for("的", true), Some("ㄉ ㄜ˙"));
        assert!(exceptions.character_fixes.is_empty());

        assert!(Exceptions::open(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn collision_policy_names() {
        assert_eq!("keep-all".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::KeepAll);
        assert_eq!("by-word".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::ByWord);
        assert!("words".parse::<CollisionPolicy>().is_err());
    }
}
