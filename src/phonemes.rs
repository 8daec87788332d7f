//! Phonemes here are zhuyin (bopomofo) symbols. Each symbol is close enough to a single phone
//! that we use them directly as the acoustic model's phone set, which keeps the lexicon readable
//! and avoids a second mapping table.
//!
//! The romaniser gives us one cluster of symbols per character, something like `ㄏㄠˇ`. The tone
//! is the last symbol, except for the neutral tone which is written as a prefix: `˙ㄉㄜ`. Here
//! we turn those clusters into phoneme strings, either with the tone glued onto the last phone
//! (`ㄏ ㄠˇ`) or with the tone dropped (`ㄏ ㄠ`).
//!
//! See [wikipedia](https://en.wikipedia.org/wiki/Bopomofo) for the symbols themselves.
use crate::config::PhonemeConfig;
use crate::text_normaliser::is_han_word;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Written before the body of a neutral tone syllable.
pub const NEUTRAL_TONE_MARK: &str = "˙";

/// Mandarin has four tones plus the neutral (or fifth) tone.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Tone {
    /// High level, written `-` in this lexicon as the romaniser and exception table use it
    First,
    /// Rising `ˊ`
    Second,
    /// Dipping `ˇ`
    Third,
    /// Falling `ˋ`
    Fourth,
    /// Light and short `˙`, the only one written as a prefix
    Neutral,
}

impl Tone {
    /// Tone from the number used in numbered pinyin, 5 and 0 both being the neutral tone.
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            4 => Some(Self::Fourth),
            0 | 5 => Some(Self::Neutral),
            _ => None,
        }
    }

    pub fn is_prefix(&self) -> bool {
        matches!(self, Self::Neutral)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::First => write!(f, "-"),
            Self::Second => write!(f, "ˊ"),
            Self::Third => write!(f, "ˇ"),
            Self::Fourth => write!(f, "ˋ"),
            Self::Neutral => write!(f, "{}", NEUTRAL_TONE_MARK),
        }
    }
}

impl FromStr for Tone {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-" | "ˉ" => Ok(Self::First),
            "ˊ" => Ok(Self::Second),
            "ˇ" => Ok(Self::Third),
            "ˋ" => Ok(Self::Fourth),
            NEUTRAL_TONE_MARK => Ok(Self::Neutral),
            _ => anyhow::bail!("{} is not a tone marker", s),
        }
    }
}

/// A pronunciation cluster split into its phones and tone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Syllable<'a> {
    pub body: Vec<&'a str>,
    /// The marker exactly as it appeared in the cluster
    pub tone: Option<&'a str>,
}

impl<'a> Syllable<'a> {
    /// Splits a cluster into symbols and pulls out the tone. A neutral tone marker at the start
    /// takes priority, otherwise the final symbol is the tone. A cluster that doesn't end in a
    /// tone is kept whole rather than losing its last phone.
    pub fn parse(cluster: &'a str) -> Self {
        let symbols = cluster.graphemes(true).collect::<Vec<_>>();
        match symbols.split_first() {
            Some((first, rest)) if *first == NEUTRAL_TONE_MARK => Self {
                body: rest.to_vec(),
                tone: Some(*first),
            },
            _ => match symbols.split_last() {
                Some((last, rest)) if Tone::from_str(last).is_ok() => Self {
                    body: rest.to_vec(),
                    tone: Some(*last),
                },
                _ => {
                    if !symbols.is_empty() {
                        warn!("Pronunciation '{}' has no tone marker", cluster);
                    }
                    Self {
                        body: symbols,
                        tone: None,
                    }
                }
            },
        }
    }

    pub fn tone(&self) -> Option<Tone> {
        self.tone.and_then(|t| Tone::from_str(t).ok())
    }
}

/// Converts one character's pronunciation cluster into a phoneme string. If the romaniser didn't
/// know the character it hands the character back, these are passed through untouched for the
/// exception table to deal with.
pub fn character_to_phones(cluster: &str, config: &PhonemeConfig) -> String {
    if is_han_word(cluster) {
        debug!("No pronunciation for '{}', passing through", cluster);
        return cluster.to_string();
    }
    let syllable = Syllable::parse(cluster);
    let mut phones = syllable.body.join(&config.separator);
    if config.use_tone {
        if let Some(tone) = syllable.tone {
            phones.push_str(tone);
        }
    }
    phones
}

/// Splits a phoneme string into its individual units. Units are whitespace separated, if a
/// custom separator is configured that's split on as well. Without tones every symbol is its own
/// unit, with tones a glued syllable stays whole so the tone keeps its body.
pub fn phone_units<'a>(phones: &'a str, config: &PhonemeConfig) -> Vec<&'a str> {
    let separator = config.separator.trim();
    phones
        .split_whitespace()
        .flat_map(|unit| {
            if separator.is_empty() {
                vec![unit]
            } else {
                unit.split(separator).filter(|x| !x.is_empty()).collect()
            }
        })
        .flat_map(|unit| {
            if config.use_tone {
                vec![unit]
            } else {
                unit.graphemes(true).collect()
            }
        })
        .collect()
}

/// Normalises a word's phoneme string so each unit is separated by exactly one space, which is
/// the form that goes into `lexicon.txt`.
pub fn resplit(phones: &str, config: &PhonemeConfig) -> String {
    phone_units(phones, config).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(use_tone: bool) -> PhonemeConfig {
        PhonemeConfig {
            use_tone,
            ..Default::default()
        }
    }

    #[test]
    fn tone_markers() {
        for tone in [
            Tone::First,
            Tone::Second,
            Tone::Third,
            Tone::Fourth,
            Tone::Neutral,
        ] {
            assert_eq!(Tone::from_str(&tone.to_string()).unwrap(), tone);
        }
        assert_eq!(Tone::from_number(3), Some(Tone::Third));
        assert_eq!(Tone::from_number(5), Some(Tone::Neutral));
        assert_eq!(Tone::from_number(6), None);
        assert!(Tone::from_str("ㄚ").is_err());
    }

    #[test]
    fn trailing_tone() {
        for (cluster, tone) in [("ㄏㄠˇ", "ˇ"), ("ㄕˋ", "ˋ"), ("ㄋㄧˊ", "ˊ"), ("ㄊㄧㄢ-", "-")] {
            let phones = character_to_phones(cluster, &config(true));
            assert!(phones.ends_with(tone), "{}", phones);
            let without = phones.strip_suffix(tone).unwrap();
            assert!(!without.ends_with(' '), "{}", phones);
        }
        assert_eq!(character_to_phones("ㄏㄠˇ", &config(true)), "ㄏ ㄠˇ");
        assert_eq!(character_to_phones("ㄏㄠˇ", &config(false)), "ㄏ ㄠ");
        assert_eq!(character_to_phones("ㄐㄧㄝˋ", &config(true)), "ㄐ ㄧ ㄝˋ");
    }

    #[test]
    fn neutral_tone_prefix() {
        let toned = character_to_phones("˙ㄉㄜ", &config(true));
        assert_eq!(toned, "ㄉ ㄜ˙");
        assert_eq!(toned.split(' ').last(), Some("ㄜ˙"));

        let toneless = character_to_phones("˙ㄉㄜ", &config(false));
        assert_eq!(toneless, "ㄉ ㄜ");
        assert!(!toneless.contains(NEUTRAL_TONE_MARK));
    }

    #[test]
    fn unknown_character_passthrough() {
        assert_eq!(character_to_phones("勳", &config(true)), "勳");
        assert_eq!(character_to_phones("勳", &config(false)), "勳");
    }

    #[test]
    fn custom_separator() {
        let glued = PhonemeConfig {
            separator: String::new(),
            ..Default::default()
        };
        assert_eq!(character_to_phones("ㄏㄠˇ", &glued), "ㄏㄠˇ");
        assert_eq!(resplit("ㄋㄧˇ ㄏㄠˇ", &glued), "ㄋㄧˇ ㄏㄠˇ");

        let plus = PhonemeConfig {
            separator: "+".to_string(),
            ..Default::default()
        };
        assert_eq!(character_to_phones("ㄏㄠˇ", &plus), "ㄏ+ㄠˇ");
        assert_eq!(resplit("ㄋ+ㄧˇ ㄏ+ㄠˇ", &plus), "ㄋ ㄧˇ ㄏ ㄠˇ");
    }

    #[test]
    fn syllable_without_tone() {
        let syllable = Syllable::parse("ㄏㄠ");
        assert_eq!(syllable.body, vec!["ㄏ", "ㄠ"]);
        assert_eq!(syllable.tone(), None);

        let syllable = Syllable::parse("˙ㄇㄚ");
        assert_eq!(syllable.tone(), Some(Tone::Neutral));
        assert_eq!(syllable.body, vec!["ㄇ", "ㄚ"]);
    }

    #[test]
    fn toneless_resplit_per_symbol() {
        let glued = PhonemeConfig {
            use_tone: false,
            separator: String::new(),
            ..Default::default()
        };
        assert_eq!(resplit("ㄋㄧ ㄏㄠ", &glued), "ㄋ ㄧ ㄏ ㄠ");
        assert_eq!(resplit("ㄋ ㄧ", &config(false)), "ㄋ ㄧ");
        assert_eq!(resplit("ㄋㄧˇ", &config(true)), "ㄋㄧˇ");
    }

    #[test]
    fn resplit_spacing() {
        assert_eq!(resplit("  ㄋ ㄧˇ   ㄏ ㄠˇ ", &config(true)), "ㄋ ㄧˇ ㄏ ㄠˇ");
        assert_eq!(resplit("", &config(true)), "");
    }
}
