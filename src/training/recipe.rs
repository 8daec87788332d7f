//! Ties the pieces together: metadata in, Kaldi data directory out.
//!
//! The output layout is
//!
//! ```text
//! <output>/train/{spk2gender,wav.scp,text,utt2spk}
//! <output>/test/{spk2gender,wav.scp,text,utt2spk}
//! <output>/local/corpus.txt
//! <output>/local/dict/{lexicon.txt,nonsilence_phones.txt,silence_phones.txt,optional_silence.txt}
//! ```
//!
//! Speakers are numbered across both splits so an id means the same person in train and test.
//! The lexicon covers both splits, but the language model corpus only uses the train split.
use super::analytics::{Analytics, AnalyticsGenerator};
use super::common_voice::Dataset;
use super::kaldi::{self, utterance_suffix, Gender, SpeakerMap, Utterance};
use crate::g2p::G2pModel;
use crate::lexicon::Lexicon;
use crate::text_normaliser::fix_characters;
use crate::tokeniser::Tokeniser;
use anyhow::Context;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct Recipe<'a> {
    pub tokeniser: &'a dyn Tokeniser,
    pub g2p: &'a G2pModel,
    /// Directory the clip paths are relative to
    pub clips_dir: PathBuf,
    pub sample_rate: u32,
}

/// Everything needed to write the data directory.
#[derive(Debug)]
pub struct PreparedData {
    pub train: Vec<Utterance>,
    pub test: Vec<Utterance>,
    pub lexicon: Lexicon,
    pub analytics: Analytics,
}

impl<'a> Recipe<'a> {
    /// Filters, segments and assigns ids to both splits then builds the lexicon from them.
    /// `extra_words` are added to the lexicon without any sentence context.
    pub fn prepare(
        &self,
        mut train: Dataset,
        mut test: Dataset,
        extra_words: &[String],
    ) -> anyhow::Result<PreparedData> {
        let mut analytics = AnalyticsGenerator::new();
        for (name, dataset) in [("train", &mut train), ("test", &mut test)] {
            let excluded = dataset.retain_without_latin();
            info!("Excluded {} {} sentences containing latin letters", excluded, name);
            analytics.push_excluded(excluded);
            analytics.push_rejected(dataset.rejected);
            if !dataset.validate() {
                warn!("Problems found in the {} split", name);
            }
        }

        let speakers = SpeakerMap::from_clients(
            train
                .clips
                .iter()
                .chain(test.clips.iter())
                .map(|clip| clip.client_id.as_str()),
        );
        info!("Found {} speakers", speakers.len());

        let train = self.utterances(&train, &speakers).context("train split")?;
        let test = self.utterances(&test, &speakers).context("test split")?;

        let mut seen = HashSet::new();
        for utt in train.iter().chain(test.iter()) {
            if !seen.insert(utt.id.as_str()) {
                anyhow::bail!("Utterance id {} is used more than once", utt.id);
            }
        }

        let mut lexicon = Lexicon::new(self.g2p.config().collisions);
        for utt in train.iter().chain(test.iter()) {
            analytics.push_sentence(&utt.words);
            lexicon
                .extend_from_sentences(std::slice::from_ref(&utt.words), self.g2p)
                .with_context(|| format!("Failed to build pronunciations for {}", utt.id))?;
        }
        for word in extra_words.iter().map(|w| w.trim()).filter(|w| !w.is_empty()) {
            lexicon
                .insert_word(word, self.g2p)
                .with_context(|| format!("Failed to build pronunciation for {}", word))?;
        }
        info!(
            "Lexicon has {} entries for {} words",
            lexicon.len(),
            lexicon.words()
        );

        let analytics = analytics.generate_report(&lexicon);
        Ok(PreparedData {
            train,
            test,
            lexicon,
            analytics,
        })
    }

    fn utterances(
        &self,
        dataset: &Dataset,
        speakers: &SpeakerMap,
    ) -> anyhow::Result<Vec<Utterance>> {
        let fixes = &self.g2p.exceptions().character_fixes;
        let mut utterances = Vec::with_capacity(dataset.clips.len());
        for clip in &dataset.clips {
            let suffix = utterance_suffix(&clip.path)
                .with_context(|| format!("Can't get an utterance id from {}", clip.path))?;
            let speaker = speakers
                .speaker_id(&clip.client_id)
                .with_context(|| format!("No speaker for client {}", clip.client_id))?;
            let words = self.tokeniser.segment(&fix_characters(&clip.sentence, fixes));
            if words.is_empty() {
                warn!("Skipping {}, no words in '{}'", clip.path, clip.sentence);
                continue;
            }
            utterances.push(Utterance {
                id: format!("{}_{}", speaker, suffix),
                speaker,
                gender: Gender::from_common_voice(clip.gender.as_deref()),
                audio: self.clips_dir.join(&clip.path),
                words,
            });
        }
        utterances.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(utterances)
    }

    /// Writes the prepared data out under `output`.
    pub fn write(&self, prepared: &PreparedData, output: &Path) -> anyhow::Result<()> {
        kaldi::write_split(&output.join("train"), &prepared.train, self.sample_rate)?;
        kaldi::write_split(&output.join("test"), &prepared.test, self.sample_rate)?;

        let local = output.join("local");
        kaldi::write_dict(&local.join("dict"), &prepared.lexicon)?;

        let corpus = local.join("corpus.txt");
        let f = std::fs::File::create(&corpus)
            .with_context(|| format!("Unable to create {}", corpus.display()))?;
        kaldi::write_corpus(&prepared.train, std::io::BufWriter::new(f))?;
        Ok(())
    }
}
