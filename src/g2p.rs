//! Grapheme to phoneme conversion for whole words and sentences. This combines the romaniser,
//! the exception tables and the phoneme normalisation into the two operations the lexicon needs.
//!
//! Pronunciation can depend on the surrounding characters so the preferred route is
//! `sentence_to_aligned_phones`, which romanises the whole sentence at once and then cuts the
//! result back up along the word boundaries. `word_to_phones` is there for words that turn up
//! without a sentence.
use crate::config::{Exceptions, PhonemeConfig};
use crate::error::LexiconError;
use crate::phonemes::character_to_phones;
use crate::romaniser::Romaniser;
use crate::text_normaliser::script_runs;
use tracing::debug;

pub struct G2pModel {
    romaniser: Box<dyn Romaniser>,
    exceptions: Exceptions,
    config: PhonemeConfig,
}

#[derive(Default)]
pub struct G2pModelBuilder {
    romaniser: Option<Box<dyn Romaniser>>,
    exceptions: Option<Exceptions>,
    config: Option<PhonemeConfig>,
}

impl G2pModelBuilder {
    pub fn add_romaniser(mut self, romaniser: impl Romaniser + 'static) -> Self {
        self.romaniser = Some(Box::new(romaniser));
        self
    }

    pub fn add_exceptions(mut self, exceptions: Exceptions) -> Self {
        self.exceptions = Some(exceptions);
        self
    }

    pub fn config(mut self, config: PhonemeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> anyhow::Result<G2pModel> {
        let exceptions = self.exceptions.unwrap_or_default();
        exceptions.validate()?;
        match self.romaniser {
            Some(romaniser) => Ok(G2pModel {
                romaniser,
                exceptions,
                config: self.config.unwrap_or_default(),
            }),
            None => anyhow::bail!("No means of working out pronunciation"),
        }
    }
}

impl G2pModel {
    pub fn create() -> G2pModelBuilder {
        G2pModelBuilder::default()
    }

    pub fn config(&self) -> &PhonemeConfig {
        &self.config
    }

    pub fn exceptions(&self) -> &Exceptions {
        &self.exceptions
    }

    /// A per-character override takes the place of the romaniser output for that character.
    fn character_phones(&self, character: &str, cluster: &str) -> String {
        match self.exceptions.override_for(character, self.config.use_tone) {
            Some(phones) => phones.to_string(),
            None => character_to_phones(cluster, &self.config),
        }
    }

    /// Pronunciation of a word in isolation. Han runs go through the romaniser, anything else is
    /// kept as is.
    pub fn word_to_phones(&self, word: &str) -> Result<String, LexiconError> {
        if let Some(phones) = self.exceptions.override_for(word, self.config.use_tone) {
            return Ok(phones.to_string());
        }
        let mut phones = vec![];
        for (han, run) in script_runs(word) {
            if han {
                let clusters = self.romaniser.romanise(run);
                let characters = run.chars().count();
                if clusters.len() != characters {
                    return Err(LexiconError::alignment(run, characters, clusters.len()));
                }
                for (c, cluster) in run.chars().zip(clusters.iter()) {
                    phones.push(self.character_phones(c.encode_utf8(&mut [0; 4]), cluster));
                }
            } else {
                phones.push(run.to_string());
            }
        }
        Ok(self
            .exceptions
            .fix_phones(&phones.join(" "), self.config.use_tone))
    }

    /// Romanises the tokens as one sentence and returns one phoneme string per token. The tokens
    /// must cover exactly the characters the romaniser produced pronunciations for, if they
    /// don't the sentence is rejected rather than misaligning every word after the mismatch.
    pub fn sentence_to_aligned_phones<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> Result<Vec<String>, LexiconError> {
        let sentence = tokens.iter().map(|t| t.as_ref()).collect::<String>();
        let clusters = self.romaniser.romanise(&sentence);

        let characters = sentence.chars().count();
        if clusters.len() != characters {
            return Err(LexiconError::alignment(sentence, characters, clusters.len()));
        }

        let phones = sentence
            .chars()
            .zip(clusters.iter())
            .map(|(c, cluster)| self.character_phones(c.encode_utf8(&mut [0; 4]), cluster))
            .collect::<Vec<_>>();

        let mut result = Vec::with_capacity(tokens.len());
        let mut start = 0;
        for token in tokens.iter() {
            let end = start + token.as_ref().chars().count();
            let word_phones = phones[start..end].join(" ");
            debug!("{} -> {}", token.as_ref(), word_phones);
            result.push(
                self.exceptions
                    .fix_phones(&word_phones, self.config.use_tone),
            );
            start = end;
        }
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::romaniser::ZhuyinRomaniser;
    use std::collections::BTreeMap;

    /// Returns the same 2 symbol plus tone cluster for every character
    pub(crate) struct FixedRomaniser;

    impl Romaniser for FixedRomaniser {
        fn romanise(&self, text: &str) -> Vec<String> {
            text.chars().map(|_| "ㄅㄚˋ".to_string()).collect()
        }
    }

    /// Looks characters up in a table, unknown characters come back unchanged
    pub(crate) struct TableRomaniser(pub BTreeMap<char, &'static str>);

    impl Romaniser for TableRomaniser {
        fn romanise(&self, text: &str) -> Vec<String> {
            text.chars()
                .map(|c| self.0.get(&c).map(|s| s.to_string()).unwrap_or(c.to_string()))
                .collect()
        }
    }

    /// Drops the final character, simulating a romaniser that loses track of the input
    struct LossyRomaniser;

    impl Romaniser for LossyRomaniser {
        fn romanise(&self, text: &str) -> Vec<String> {
            let mut clusters = FixedRomaniser.romanise(text);
            clusters.pop();
            clusters
        }
    }

    fn model(romaniser: impl Romaniser + 'static, use_tone: bool) -> G2pModel {
        G2pModel::create()
            .add_romaniser(romaniser)
            .config(PhonemeConfig {
                use_tone,
                ..Default::default()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn builder_needs_romaniser() {
        assert!(G2pModel::create().build().is_err());

        let mut bad = Exceptions::empty();
        bad.substitutions
            .toned
            .insert("ㄅ".to_string(), "ㄅㄅ".to_string());
        assert!(G2pModel::create()
            .add_romaniser(FixedRomaniser)
            .add_exceptions(bad)
            .build()
            .is_err());
    }

    #[test]
    fn aligned_hello_world() {
        let g2p = model(FixedRomaniser, true);
        let phones = g2p.sentence_to_aligned_phones(&["你好", "世界"]).unwrap();
        assert_eq!(phones.len(), 2);
        for word in &phones {
            assert_eq!(word, "ㄅ ㄚˋ ㄅ ㄚˋ");
            assert_eq!(word.split(' ').count(), 4);
        }
    }

    #[test]
    fn aligned_order_follows_tokens() {
        let table = [('你', "ㄋㄧˇ"), ('好', "ㄏㄠˇ"), ('世', "ㄕˋ"), ('界', "ㄐㄧㄝˋ")];
        let g2p = model(TableRomaniser(table.into_iter().collect()), true);
        let phones = g2p
            .sentence_to_aligned_phones(&["你", "好世", "界"])
            .unwrap();
        assert_eq!(phones, vec!["ㄋ ㄧˇ", "ㄏ ㄠˇ ㄕˋ", "ㄐ ㄧ ㄝˋ"]);

        let g2p = model(TableRomaniser(table.into_iter().collect()), false);
        let phones = g2p.sentence_to_aligned_phones(&["你好", "世界"]).unwrap();
        assert_eq!(phones, vec!["ㄋ ㄧ ㄏ ㄠ", "ㄕ ㄐ ㄧ ㄝ"]);
    }

    #[test]
    fn alignment_holds_for_every_split() {
        let g2p = model(ZhuyinRomaniser, true);
        let sentence = "我們今天去公園散步".chars().collect::<Vec<_>>();
        let whole = g2p
            .sentence_to_aligned_phones(&[sentence.iter().collect::<String>()])
            .unwrap();
        let total_units = whole[0].split_whitespace().count();

        // Every way of cutting the sentence into tokens, a cut after character i if bit i is set
        for mask in 0u32..(1 << (sentence.len() - 1)) {
            let mut tokens = vec![];
            let mut current = String::new();
            for (i, c) in sentence.iter().enumerate() {
                current.push(*c);
                if i + 1 == sentence.len() || mask & (1 << i) != 0 {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            let phones = g2p.sentence_to_aligned_phones(&tokens).unwrap();
            assert_eq!(phones.len(), tokens.len());
            let units = phones
                .iter()
                .map(|p| p.split_whitespace().count())
                .sum::<usize>();
            assert_eq!(units, total_units, "{:?}", tokens);
            assert_eq!(phones.join(" "), whole[0], "{:?}", tokens);
        }
    }

    #[test]
    fn misalignment_is_an_error() {
        let g2p = model(LossyRomaniser, true);
        assert!(g2p.word_to_phones("你好").is_err());

        let err = g2p
            .sentence_to_aligned_phones(&["你好", "世界"])
            .unwrap_err();
        assert_eq!(
            err,
            LexiconError::Alignment {
                sentence: "你好世界".to_string(),
                characters: 4,
                phones: 3
            }
        );
    }

    #[test]
    fn override_bypasses_romaniser() {
        for use_tone in [true, false] {
            let g2p = model(FixedRomaniser, use_tone);
            let expected = if use_tone { "ㄕ ㄞˋ" } else { "ㄕ ㄞ" };
            assert_eq!(g2p.word_to_phones("曬").unwrap(), expected);
            let phones = g2p.sentence_to_aligned_phones(&["曬", "衣服"]).unwrap();
            assert_eq!(phones[0], expected);
        }
    }

    #[test]
    fn unknown_characters_are_fixed() {
        // No table entry for 勳 or 艷 so the romaniser hands them back unchanged
        let table = [('章', "ㄓㄤ-")];
        let g2p = model(TableRomaniser(table.into_iter().collect()), true);
        assert_eq!(g2p.word_to_phones("勳章").unwrap(), "ㄒ ㄩ ㄣ- ㄓ ㄤ-");
        assert_eq!(g2p.word_to_phones("艷").unwrap(), "ㄧ ㄢˋ");

        let g2p = model(TableRomaniser(table.into_iter().collect()), false);
        assert_eq!(g2p.word_to_phones("勳章").unwrap(), "ㄒ ㄩ ㄣ ㄓ ㄤ");
    }

    #[test]
    fn word_with_mixed_script() {
        let g2p = model(FixedRomaniser, true);
        assert_eq!(g2p.word_to_phones("好3好").unwrap(), "ㄅ ㄚˋ 3 ㄅ ㄚˋ");
    }
}
