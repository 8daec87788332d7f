//! Getting a pronunciation for each character. The `pinyin` crate knows the readings of the han
//! characters, but gives them to us as pinyin. The lexicon uses zhuyin so this does the spelling
//! conversion from pinyin to zhuyin as well.
//!
//! Pinyin spelling hides a few things that zhuyin writes out explicitly:
//!
//! * `y` and `w` are spelling conventions for syllables starting with the medials i, u and ü
//! * after j, q and x, u is really ü
//! * iu, ui and un are contractions of iou, uei and uen
//! * zhi, chi, shi, ri, zi, ci and si have no vowel in zhuyin, they're just the initial
//!
//! Once those are undone it's a straight table lookup.
use crate::phonemes::Tone;
use pinyin::ToPinyin;

/// Something that can provide a pronunciation cluster for every character in a piece of text.
pub trait Romaniser {
    /// Returns exactly one cluster per input character, in order. Characters with no known
    /// pronunciation are returned unchanged.
    fn romanise(&self, text: &str) -> Vec<String>;
}

/// Romaniser producing zhuyin clusters like `ㄏㄠˇ` or `˙ㄉㄜ`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZhuyinRomaniser;

impl Romaniser for ZhuyinRomaniser {
    fn romanise(&self, text: &str) -> Vec<String> {
        text.chars()
            .map(|c| {
                c.to_pinyin()
                    .and_then(|p| {
                        let tone = tone_from_numbered(p.with_tone_num_end())?;
                        pinyin_to_zhuyin(p.plain(), tone)
                    })
                    .unwrap_or_else(|| c.to_string())
            })
            .collect()
    }
}

/// The tone of a numbered pinyin syllable, a syllable without a number is neutral.
fn tone_from_numbered(syllable: &str) -> Option<Tone> {
    match syllable.chars().last() {
        Some(c) if c.is_ascii_digit() => Tone::from_number(c.to_digit(10)?),
        Some(_) => Some(Tone::Neutral),
        None => None,
    }
}

const INITIALS: &[(&str, &str)] = &[
    ("zh", "ㄓ"),
    ("ch", "ㄔ"),
    ("sh", "ㄕ"),
    ("b", "ㄅ"),
    ("p", "ㄆ"),
    ("m", "ㄇ"),
    ("f", "ㄈ"),
    ("d", "ㄉ"),
    ("t", "ㄊ"),
    ("n", "ㄋ"),
    ("l", "ㄌ"),
    ("g", "ㄍ"),
    ("k", "ㄎ"),
    ("h", "ㄏ"),
    ("j", "ㄐ"),
    ("q", "ㄑ"),
    ("x", "ㄒ"),
    ("r", "ㄖ"),
    ("z", "ㄗ"),
    ("c", "ㄘ"),
    ("s", "ㄙ"),
];

fn final_to_zhuyin(fin: &str) -> Option<&'static str> {
    let zhuyin = match fin {
        "" => "",
        "a" => "ㄚ",
        "o" => "ㄛ",
        "e" => "ㄜ",
        "ê" => "ㄝ",
        "ai" => "ㄞ",
        "ei" => "ㄟ",
        "ao" => "ㄠ",
        "ou" => "ㄡ",
        "an" => "ㄢ",
        "en" => "ㄣ",
        "ang" => "ㄤ",
        "eng" => "ㄥ",
        "er" => "ㄦ",
        "ong" => "ㄨㄥ",
        "i" => "ㄧ",
        "ia" => "ㄧㄚ",
        "io" => "ㄧㄛ",
        "ie" => "ㄧㄝ",
        "iai" => "ㄧㄞ",
        "iao" => "ㄧㄠ",
        "iou" => "ㄧㄡ",
        "ian" => "ㄧㄢ",
        "in" => "ㄧㄣ",
        "iang" => "ㄧㄤ",
        "ing" => "ㄧㄥ",
        "iong" => "ㄩㄥ",
        "u" => "ㄨ",
        "ua" => "ㄨㄚ",
        "uo" => "ㄨㄛ",
        "uai" => "ㄨㄞ",
        "uei" => "ㄨㄟ",
        "uan" => "ㄨㄢ",
        "uen" => "ㄨㄣ",
        "uang" => "ㄨㄤ",
        "ueng" => "ㄨㄥ",
        "ü" => "ㄩ",
        "üe" => "ㄩㄝ",
        "üan" => "ㄩㄢ",
        "ün" => "ㄩㄣ",
        _ => return None,
    };
    Some(zhuyin)
}

/// Converts a toneless pinyin syllable into a zhuyin cluster with the given tone. Returns `None`
/// for syllables with no zhuyin spelling (interjections like `hm` or `ng`).
pub fn pinyin_to_zhuyin(syllable: &str, tone: Tone) -> Option<String> {
    let syllable = syllable.to_lowercase().replace('v', "ü");
    if syllable.is_empty() {
        return None;
    }

    let (initial, zhuyin_initial, rest) = match INITIALS
        .iter()
        .find(|(initial, _)| syllable.starts_with(initial))
    {
        Some((initial, zhuyin)) => (*initial, *zhuyin, &syllable[initial.len()..]),
        None => ("", "", syllable.as_str()),
    };

    let fin = if initial.is_empty() {
        if let Some(rest) = rest.strip_prefix('y') {
            if let Some(after) = rest.strip_prefix('u') {
                format!("ü{}", after)
            } else if rest.starts_with('i') {
                rest.to_string()
            } else {
                format!("i{}", rest)
            }
        } else if let Some(rest) = rest.strip_prefix('w') {
            if rest.starts_with('u') {
                rest.to_string()
            } else {
                format!("u{}", rest)
            }
        } else {
            rest.to_string()
        }
    } else if matches!(initial, "zh" | "ch" | "sh" | "r" | "z" | "c" | "s") && rest == "i" {
        String::new()
    } else if matches!(initial, "j" | "q" | "x") && rest.starts_with('u') {
        format!("ü{}", &rest[1..])
    } else {
        rest.to_string()
    };

    let fin = match fin.as_str() {
        "iu" => "iou".to_string(),
        "ui" => "uei".to_string(),
        "un" => "uen".to_string(),
        _ => fin,
    };

    if initial.is_empty() && fin.is_empty() {
        return None;
    }
    let zhuyin_final = final_to_zhuyin(&fin)?;

    let mut cluster = String::new();
    if tone.is_prefix() {
        cluster.push_str(&tone.to_string());
    }
    cluster.push_str(zhuyin_initial);
    cluster.push_str(zhuyin_final);
    if !tone.is_prefix() {
        cluster.push_str(&tone.to_string());
    }
    Some(cluster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_and_finals() {
        assert_eq!(pinyin_to_zhuyin("hao", Tone::Third).unwrap(), "ㄏㄠˇ");
        assert_eq!(pinyin_to_zhuyin("zhuang", Tone::First).unwrap(), "ㄓㄨㄤ-");
        assert_eq!(pinyin_to_zhuyin("xiong", Tone::Second).unwrap(), "ㄒㄩㄥˊ");
        assert_eq!(pinyin_to_zhuyin("er", Tone::Second).unwrap(), "ㄦˊ");
        assert_eq!(pinyin_to_zhuyin("bo", Tone::First).unwrap(), "ㄅㄛ-");
    }

    #[test]
    fn bare_initials() {
        assert_eq!(pinyin_to_zhuyin("shi", Tone::Fourth).unwrap(), "ㄕˋ");
        assert_eq!(pinyin_to_zhuyin("zi", Tone::Third).unwrap(), "ㄗˇ");
        assert_eq!(pinyin_to_zhuyin("ri", Tone::Fourth).unwrap(), "ㄖˋ");
        // Not a bare initial, zh + final
        assert_eq!(pinyin_to_zhuyin("zhe", Tone::Neutral).unwrap(), "˙ㄓㄜ");
    }

    #[test]
    fn y_and_w_spellings() {
        assert_eq!(pinyin_to_zhuyin("yi", Tone::First).unwrap(), "ㄧ-");
        assert_eq!(pinyin_to_zhuyin("ying", Tone::Second).unwrap(), "ㄧㄥˊ");
        assert_eq!(pinyin_to_zhuyin("you", Tone::Third).unwrap(), "ㄧㄡˇ");
        assert_eq!(pinyin_to_zhuyin("yong", Tone::Third).unwrap(), "ㄩㄥˇ");
        assert_eq!(pinyin_to_zhuyin("yuan", Tone::Second).unwrap(), "ㄩㄢˊ");
        assert_eq!(pinyin_to_zhuyin("wu", Tone::Third).unwrap(), "ㄨˇ");
        assert_eq!(pinyin_to_zhuyin("wei", Tone::Fourth).unwrap(), "ㄨㄟˋ");
        assert_eq!(pinyin_to_zhuyin("weng", Tone::First).unwrap(), "ㄨㄥ-");
    }

    #[test]
    fn contractions_and_umlaut() {
        assert_eq!(pinyin_to_zhuyin("liu", Tone::Second).unwrap(), "ㄌㄧㄡˊ");
        assert_eq!(pinyin_to_zhuyin("dui", Tone::Fourth).unwrap(), "ㄉㄨㄟˋ");
        assert_eq!(pinyin_to_zhuyin("lun", Tone::Second).unwrap(), "ㄌㄨㄣˊ");
        assert_eq!(pinyin_to_zhuyin("jun", Tone::First).unwrap(), "ㄐㄩㄣ-");
        assert_eq!(pinyin_to_zhuyin("xue", Tone::Second).unwrap(), "ㄒㄩㄝˊ");
        assert_eq!(pinyin_to_zhuyin("lü", Tone::Fourth).unwrap(), "ㄌㄩˋ");
        assert_eq!(pinyin_to_zhuyin("nv", Tone::Third).unwrap(), "ㄋㄩˇ");
    }

    #[test]
    fn no_zhuyin_spelling() {
        assert_eq!(pinyin_to_zhuyin("hm", Tone::Neutral), None);
        assert_eq!(pinyin_to_zhuyin("ng", Tone::Second), None);
        assert_eq!(pinyin_to_zhuyin("", Tone::First), None);
    }

    #[test]
    fn numbered_tones() {
        assert_eq!(tone_from_numbered("hao3"), Some(Tone::Third));
        assert_eq!(tone_from_numbered("ma5"), Some(Tone::Neutral));
        assert_eq!(tone_from_numbered("ma"), Some(Tone::Neutral));
        assert_eq!(tone_from_numbered(""), None);
    }

    #[test]
    fn romanise_characters() {
        let romaniser = ZhuyinRomaniser;
        assert_eq!(romaniser.romanise("你世界"), vec!["ㄋㄧˇ", "ㄕˋ", "ㄐㄧㄝˋ"]);
        // One cluster per character, even when there's no reading
        let clusters = romaniser.romanise("你，a");
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[1], "，");
        assert_eq!(clusters[2], "a");
    }
}
