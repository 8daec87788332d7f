//! Transcript clean-up that happens before segmentation. The corpus transcripts are traditional
//! Chinese with the odd simplified or variant character mixed in, plus punctuation and sometimes
//! English. Sentences with English in them are dropped entirely as we have no way of producing a
//! zhuyin pronunciation for them.
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::BTreeMap;

/// Whether the character is in the CJK Unified Ideographs block, the only script the lexicon
/// handles.
pub fn is_han(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Whether every character of a (non-empty) word is a han character.
pub fn is_han_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(is_han)
}

/// Returns false if there's any ASCII or fullwidth latin letter in the text.
pub fn contains_no_latin(text: &str) -> bool {
    static LATIN_REGEX: OnceCell<Regex> = OnceCell::new();
    let latin_regex = LATIN_REGEX
        .get_or_init(|| Regex::new(r#"[a-zA-Z\x{ff21}-\x{ff3a}\x{ff41}-\x{ff5a}]"#).unwrap());

    !latin_regex.is_match(text)
}

/// Replace characters known to trip up segmentation or romanisation with the form the
/// dictionaries expect.
pub fn fix_characters(sentence: &str, fixes: &BTreeMap<String, String>) -> String {
    let mut s = sentence.to_string();
    for (from, to) in fixes.iter() {
        if s.contains(from.as_str()) {
            s = s.replace(from.as_str(), to);
        }
    }
    s
}

/// Splits text into alternating runs of han and non-han characters, keeping order.
pub fn script_runs(text: &str) -> Vec<(bool, &str)> {
    let mut runs = vec![];
    let mut start = 0;
    let mut current = None;
    for (i, c) in text.char_indices() {
        let han = is_han(c);
        match current {
            Some(h) if h != han => {
                runs.push((h, &text[start..i]));
                start = i;
                current = Some(han);
            }
            None => current = Some(han),
            _ => {}
        }
    }
    if let Some(h) = current {
        runs.push((h, &text[start..]));
    }
    runs
}
