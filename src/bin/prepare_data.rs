use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use zhuyin_kaldi::romaniser::ZhuyinRomaniser;
use zhuyin_kaldi::tokeniser::JiebaTokeniser;
use zhuyin_kaldi::training::common_voice::Dataset;
use zhuyin_kaldi::training::Recipe;
use zhuyin_kaldi::*;

#[derive(Parser, Debug)]
pub struct Args {
    /// Common Voice release directory containing train.tsv, test.tsv and clips/
    #[clap(long, env = "DATA_DIR")]
    data_dir: PathBuf,
    /// Where to write the Kaldi data directory
    #[clap(short, long, default_value = "data")]
    output: PathBuf,
    /// Jieba dictionary to segment with, `dict.txt.big` works well for traditional Chinese. The
    /// built-in dictionary is used if not given
    #[clap(long)]
    jieba_dict: Option<PathBuf>,
    /// JSON file of exceptions to merge over the built-in tables
    #[clap(long)]
    exceptions: Option<PathBuf>,
    /// Leave tones out of the phones
    #[clap(long)]
    no_tone: bool,
    /// Separator placed between the phones of a character
    #[clap(long, default_value = " ")]
    separator: String,
    /// How to handle a word with more than one pronunciation: keep-all or by-word
    #[clap(long, default_value = "keep-all")]
    collisions: CollisionPolicy,
    /// Sample rate sox converts the clips to
    #[clap(long, default_value = "16000")]
    sample_rate: u32,
    /// Saves a JSON report on the lexicon and dataset
    #[clap(long)]
    analysis: Option<PathBuf>,
    /// File of extra words, one per line, to add to the lexicon
    #[clap(long)]
    extra_words: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    zhuyin_kaldi::setup_logging();
    let args = Args::parse();

    info!("Loading resources");

    let tokeniser = match &args.jieba_dict {
        Some(path) => JiebaTokeniser::open(path)?,
        None => JiebaTokeniser::default(),
    };

    let mut exceptions = Exceptions::default();
    if let Some(path) = &args.exceptions {
        exceptions.merge(Exceptions::open(path)?)?;
    }

    let extra_words = match &args.extra_words {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Unable to read {}", path.display()))?
            .lines()
            .map(|x| x.to_string())
            .collect(),
        None => vec![],
    };

    let g2p = G2pModel::create()
        .add_romaniser(ZhuyinRomaniser)
        .add_exceptions(exceptions)
        .config(PhonemeConfig {
            use_tone: !args.no_tone,
            separator: args.separator.clone(),
            collisions: args.collisions,
        })
        .build()?;

    let train = Dataset::load(args.data_dir.join("train.tsv"))?;
    let test = Dataset::load(args.data_dir.join("test.tsv"))?;

    let recipe = Recipe {
        tokeniser: &tokeniser,
        g2p: &g2p,
        clips_dir: args.data_dir.join("clips"),
        sample_rate: args.sample_rate,
    };

    let prepared = recipe.prepare(train, test, &extra_words)?;
    recipe.write(&prepared, &args.output)?;

    info!("Number of lexicon entries: {}", prepared.lexicon.len());
    info!("Number of phones: {}", prepared.analytics.phones.len());
    if !prepared.analytics.unknown_characters.is_empty() {
        info!(
            "Characters without a pronunciation: {}",
            prepared.analytics.unknown_characters.len()
        );
    }

    if let Some(path) = &args.analysis {
        let report = serde_json::to_string_pretty(&prepared.analytics)?;
        fs::write(path, report).with_context(|| format!("Unable to write {}", path.display()))?;
    }

    Ok(())
}
