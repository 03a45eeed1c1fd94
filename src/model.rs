//! Read side of the gram artifacts, as a segmenter would use them.

use std::path::Path;

use memmap2::Mmap;

use crate::artifact::ArtifactPaths;
use crate::bigram;
use crate::errors::{GramError, Result};
use crate::static_table::StaticHashTable;
use crate::term_index::{TermIndex, OOV_ID};
use crate::weight_array::WeightArray;

/// Memory-mapped unigram index, weights and bigram table.
pub struct GramModel {
    pub index: TermIndex<Mmap>,
    pub weights: WeightArray,
    pub bigrams: StaticHashTable<Mmap>,
}

impl GramModel {
    pub fn open(paths: &ArtifactPaths) -> Result<Self> {
        let index = TermIndex::load(&paths.index)?;
        let weights = WeightArray::load(&paths.weights)?;
        if weights.len() != index.len() + 1 {
            return Err(GramError::invalid(
                &paths.weights,
                format!(
                    "{} weights for {} indexed terms",
                    weights.len(),
                    index.len()
                ),
            ));
        }
        let bigrams = StaticHashTable::load(&paths.bigram)?;
        Ok(Self {
            index,
            weights,
            bigrams,
        })
    }

    pub fn open_dir(dir: &Path) -> Result<Self> {
        Self::open(&ArtifactPaths::in_dir(dir))
    }

    /// Term id, or [`OOV_ID`] for unknown terms.
    pub fn id(&self, term: &str) -> i32 {
        match self.index.get(term, OOV_ID) {
            id if id > 0 => id,
            _ => OOV_ID,
        }
    }

    pub fn unigram_cost(&self, term: &str) -> Option<f32> {
        match self.id(term) {
            OOV_ID => None,
            id => self.weights.get(id),
        }
    }

    pub fn bigram_cost(&self, left: &str, right: &str) -> Option<f32> {
        match (self.id(left), self.id(right)) {
            (OOV_ID, _) | (_, OOV_ID) => None,
            (l, r) => self.bigrams.get(bigram::pack(l, r)),
        }
    }
}
