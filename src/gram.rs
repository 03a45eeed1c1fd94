//! The `gram` build: unigram and bigram corpora in, three artifacts out.
//!
//! Stages run strictly in order and the first error stops the run:
//!
//! 1. aggregate the unigram corpus
//! 2. aggregate the bigram corpus
//! 3. derive unigram costs, assign ids, save `unigram.bin` and `unigram.idx`
//! 4. resolve bigrams against the index, save `bigram.bin`
//!
//! Artifacts saved before a failure are left on disk.

use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::artifact::{self, ArtifactPaths};
use crate::bigram::BigramTable;
use crate::corpus::{self, BigramCounts, CorpusOptions, UnigramCounts};
use crate::errors::Result;
use crate::term_index::Vocabulary;

/// Settings for a gram build.
#[derive(Clone, Debug)]
pub struct GramConfig {
    pub out_dir: PathBuf,
    pub corpus: CorpusOptions,
}

impl Default for GramConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            corpus: CorpusOptions::default(),
        }
    }
}

impl GramConfig {
    pub fn artifacts(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.out_dir)
    }
}

/// What a finished build produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GramSummary {
    pub unigram_entries: usize,
    pub unigram_total: f64,
    pub unigram_skipped: u64,
    pub bigram_entries: usize,
    pub bigram_total: i64,
    pub bigram_skipped: u64,
    pub bigram_retained: usize,
    pub bigram_dropped: usize,
    pub index_path: PathBuf,
    pub weights_path: PathBuf,
    pub bigram_path: PathBuf,
}

/// Both corpora, fully aggregated. Costs are only derived from this state,
/// once each grand total is known.
pub struct Aggregated {
    unigram_path: PathBuf,
    bigram_path: PathBuf,
    pub unigrams: UnigramCounts,
    pub bigrams: BigramCounts,
}

impl Aggregated {
    pub fn load(unigram_path: &Path, bigram_path: &Path, options: &CorpusOptions) -> Result<Self> {
        let unigrams = corpus::load_unigrams(unigram_path, options)?;
        let bigrams = corpus::load_bigrams(bigram_path, options)?;
        Ok(Self {
            unigram_path: unigram_path.to_path_buf(),
            bigram_path: bigram_path.to_path_buf(),
            unigrams,
            bigrams,
        })
    }

    /// Derives all weights, builds the index and table, and writes the
    /// artifacts.
    pub fn build(self, paths: &ArtifactPaths) -> Result<GramSummary> {
        let vocab = Vocabulary::from_unigrams(&self.unigrams, &self.unigram_path)?;
        vocab.save(&paths.index, &paths.weights)?;

        let bigrams = BigramTable::build(&self.bigrams, &vocab.index, &self.bigram_path)?;
        bigrams.save(&paths.bigram)?;
        info!(
            "saved {} bigram pairs to {}",
            bigrams.retained(),
            paths.bigram.display()
        );

        Ok(GramSummary {
            unigram_entries: self.unigrams.len(),
            unigram_total: self.unigrams.total(),
            unigram_skipped: self.unigrams.skipped(),
            bigram_entries: self.bigrams.len(),
            bigram_total: self.bigrams.total(),
            bigram_skipped: self.bigrams.skipped(),
            bigram_retained: bigrams.retained(),
            bigram_dropped: bigrams.dropped,
            index_path: paths.index.clone(),
            weights_path: paths.weights.clone(),
            bigram_path: paths.bigram.clone(),
        })
    }
}

/// Runs the whole gram build.
pub fn make_gram(unigram_path: &Path, bigram_path: &Path, config: &GramConfig) -> Result<GramSummary> {
    Aggregated::load(unigram_path, bigram_path, &config.corpus)?.build(&config.artifacts())
}

/// Writes `summary` as pretty JSON.
pub fn write_report(summary: &GramSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(summary)?;
    artifact::write_artifact(path, &json)
}
