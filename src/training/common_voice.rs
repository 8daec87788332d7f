//! Loading Common Voice metadata. Each split is a TSV file with a header row, we only care about
//! a few of the columns (who spoke, which clip, what they said and their gender) so the rest
//! (votes, age, accent, locale...) are ignored.
use crate::text_normaliser::contains_no_latin;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{error, info};

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct Clip {
    pub client_id: String,
    /// Clip file name relative to the `clips` directory
    pub path: String,
    pub sentence: String,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub clips: Vec<Clip>,
    /// Rows that couldn't be parsed
    pub rejected: usize,
}

impl Dataset {
    pub fn load(p: impl AsRef<Path>) -> anyhow::Result<Self> {
        let p = p.as_ref();
        let f = File::open(p).with_context(|| format!("Unable to open {}", p.display()))?;
        let reader = io::BufReader::new(f);
        let dataset =
            Self::from_reader(reader).with_context(|| format!("Failed to read {}", p.display()))?;
        info!(
            "Loaded {} clips from {} ({} rows rejected)",
            dataset.clips.len(),
            p.display(),
            dataset.rejected
        );
        Ok(dataset)
    }

    pub fn from_reader(reader: impl Read) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b'\t')
            .quoting(false) // Sentences contain unbalanced quotes
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for column in ["client_id", "path", "sentence"] {
            if !headers.iter().any(|h| h == column) {
                anyhow::bail!("Missing column '{}' in header: {:?}", column, headers);
            }
        }

        let mut clips = vec![];
        let mut rejected = 0;

        for (i, result) in rdr.deserialize::<Clip>().enumerate() {
            match result {
                Ok(clip) if clip.path.trim().is_empty() || clip.client_id.trim().is_empty() => {
                    // Header is line 1
                    error!("Row {} has no clip path or client: {:?}", i + 2, clip);
                    rejected += 1;
                }
                Ok(clip) => clips.push(clip),
                Err(e) => {
                    error!("Malformed row {}: {}", i + 2, e);
                    rejected += 1;
                }
            }
        }
        Ok(Self { clips, rejected })
    }

    /// Removes any clip whose transcript has latin letters in it, returning how many were
    /// removed.
    pub fn retain_without_latin(&mut self) -> usize {
        let before = self.clips.len();
        self.clips.retain(|clip| contains_no_latin(&clip.sentence));
        before - self.clips.len()
    }

    /// Validates there's nothing wrong with the dataset. Will log any errors it finds and return
    /// false
    pub fn validate(&self) -> bool {
        info!("Validating dataset");
        let mut paths = HashSet::new();
        let mut success = true;
        for clip in &self.clips {
            if clip.sentence.trim().is_empty() {
                error!("Transcript for {} is empty", clip.path);
                success = false;
            }
            if !paths.insert(clip.path.as_str()) {
                error!("Duplicate clip: {}", clip.path);
                success = false;
            }
        }
        info!("Validation complete");
        success
    }
}
