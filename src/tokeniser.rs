//! Word segmentation. Chinese doesn't put spaces between words so we need a segmenter to get
//! words for the lexicon and language model. The lexicon code only relies on the `Tokeniser`
//! trait so another segmenter (or language) can be swapped in.
use crate::text_normaliser::is_han_word;
use anyhow::Context;
use jieba_rs::Jieba;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

pub trait Tokeniser {
    /// Split a sentence into words, in order. Only words made of han characters are returned,
    /// punctuation, digits and whitespace are dropped.
    fn segment(&self, sentence: &str) -> Vec<String>;
}

/// Segmentation using jieba. For traditional Chinese you'll want to load the big dictionary
/// (`dict.txt.big`) as the built-in one is mostly simplified.
pub struct JiebaTokeniser {
    jieba: Jieba,
}

impl Default for JiebaTokeniser {
    fn default() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }
}

impl JiebaTokeniser {
    /// Load a jieba dictionary file, this replaces the built-in dictionary rather than adding to
    /// it.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Unable to open segmentation dictionary {}", path.display()))?;
        let mut reader = BufReader::new(file);
        let jieba = Jieba::with_dict(&mut reader)
            .with_context(|| format!("Invalid segmentation dictionary {}", path.display()))?;
        info!("Loaded segmentation dictionary {}", path.display());
        Ok(Self { jieba })
    }
}

impl Tokeniser for JiebaTokeniser {
    fn segment(&self, sentence: &str) -> Vec<String> {
        self.jieba
            .cut(sentence, true)
            .into_iter()
            .filter(|word| is_han_word(word))
            .map(|word| word.to_string())
            .collect()
    }
}
