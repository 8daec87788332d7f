//! Kaldi data directory files. Kaldi is quite particular, the per-utterance files need to be
//! sorted and speaker ids need to be a prefix of the utterance ids so that sorting by utterance
//! also sorts by speaker. Speaker ids are zero-padded numbers for that reason.
//!
//! See the [Kaldi data prep docs](https://kaldi-asr.org/doc/data_prep.html) for the formats.
use crate::lexicon::{Lexicon, OPTIONAL_SILENCE, SILENCE_PHONES};
use anyhow::Context;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, prelude::*, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Gender {
    /// Also used when the gender is unknown
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn from_common_voice(gender: Option<&str>) -> Self {
        match gender.map(|g| g.trim()) {
            Some("male") | Some("male_masculine") => Self::Male,
            Some("female") | Some("female_feminine") => Self::Female,
            _ => Self::default(),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Male => write!(f, "m"),
            Self::Female => write!(f, "f"),
        }
    }
}

/// The last `_` separated part of the clip's file stem, `common_voice_zh-TW_1234.mp3` gives
/// `1234`.
pub fn utterance_suffix(path: &str) -> Option<&str> {
    let stem = Path::new(path).file_stem()?.to_str()?;
    stem.rsplit('_').next().filter(|s| !s.is_empty())
}

/// Assigns speaker ids to Common Voice clients. Ids count up from 1 in the order clients are
/// first seen.
#[derive(Clone, Debug, Default)]
pub struct SpeakerMap {
    ids: HashMap<String, usize>,
}

impl SpeakerMap {
    pub fn from_clients<'a>(clients: impl IntoIterator<Item = &'a str>) -> Self {
        let mut ids = HashMap::new();
        for client in clients {
            let next = ids.len() + 1;
            ids.entry(client.to_string()).or_insert(next);
        }
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn width(&self) -> usize {
        self.ids.len().to_string().len()
    }

    /// Zero padded speaker id, every id from this map has the same width.
    pub fn speaker_id(&self, client: &str) -> Option<String> {
        self.ids
            .get(client)
            .map(|id| format!("{:0width$}", id, width = self.width()))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utterance {
    pub id: String,
    pub speaker: String,
    pub gender: Gender,
    pub audio: PathBuf,
    /// Segmented transcript
    pub words: Vec<String>,
}

pub fn write_spk2gender(utterances: &[Utterance], mut writer: impl Write) -> io::Result<()> {
    let mut speakers = BTreeMap::new();
    for utt in utterances {
        let gender = speakers.entry(utt.speaker.as_str()).or_insert(utt.gender);
        if *gender != utt.gender {
            warn!(
                "Speaker {} has conflicting genders, keeping {}",
                utt.speaker, gender
            );
        }
    }
    for (speaker, gender) in speakers {
        writeln!(writer, "{} {}", speaker, gender)?;
    }
    writer.flush()
}

/// Each utterance's audio is an mp3, sox converts it to mono wav at the given sample rate when
/// Kaldi reads it.
pub fn write_wav_scp(
    utterances: &[Utterance],
    sample_rate: u32,
    mut writer: impl Write,
) -> io::Result<()> {
    for utt in utterances {
        writeln!(
            writer,
            "{} sox {} -t wav -r {} -c 1 - |",
            utt.id,
            utt.audio.display(),
            sample_rate
        )?;
    }
    writer.flush()
}

pub fn write_text(utterances: &[Utterance], mut writer: impl Write) -> io::Result<()> {
    for utt in utterances {
        writeln!(writer, "{} {}", utt.id, utt.words.join(" "))?;
    }
    writer.flush()
}

pub fn write_utt2spk(utterances: &[Utterance], mut writer: impl Write) -> io::Result<()> {
    for utt in utterances {
        writeln!(writer, "{} {}", utt.id, utt.speaker)?;
    }
    writer.flush()
}

/// Language model training text, one segmented sentence per line.
pub fn write_corpus(utterances: &[Utterance], mut writer: impl Write) -> io::Result<()> {
    for utt in utterances {
        writeln!(writer, "{}", utt.words.join(" "))?;
    }
    writer.flush()
}

fn create(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let f = File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
    Ok(BufWriter::new(f))
}

/// Writes the acoustic data for one split: `spk2gender`, `wav.scp`, `text` and `utt2spk`.
pub fn write_split(dir: &Path, utterances: &[Utterance], sample_rate: u32) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Unable to create {}", dir.display()))?;

    write_spk2gender(utterances, create(&dir.join("spk2gender"))?)?;
    write_wav_scp(utterances, sample_rate, create(&dir.join("wav.scp"))?)?;
    write_text(utterances, create(&dir.join("text"))?)?;
    write_utt2spk(utterances, create(&dir.join("utt2spk"))?)?;

    info!("Wrote {} utterances to {}", utterances.len(), dir.display());
    Ok(())
}

/// Writes the dictionary directory: the lexicon and the phone lists.
pub fn write_dict(dir: &Path, lexicon: &Lexicon) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Unable to create {}", dir.display()))?;

    lexicon.write(create(&dir.join("lexicon.txt"))?)?;
    lexicon.write_phones(create(&dir.join("nonsilence_phones.txt"))?)?;

    let mut silence = create(&dir.join("silence_phones.txt"))?;
    for phone in SILENCE_PHONES {
        writeln!(silence, "{}", phone)?;
    }
    silence.flush()?;

    let mut optional = create(&dir.join("optional_silence.txt"))?;
    writeln!(optional, "{}", OPTIONAL_SILENCE)?;
    optional.flush()?;

    info!(
        "Wrote lexicon of {} entries to {}",
        lexicon.len(),
        dir.display()
    );
    Ok(())
}
