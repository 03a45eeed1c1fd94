//! Term → id index backed by an `fst::Map`.
//!
//! Ids are stored as the `u32` bit pattern of an `i32`, so standalone
//! dictionaries may carry any `i32` value while the gram pipeline only ever
//! stores positive ids.

use std::collections::BTreeMap;
use std::path::Path;

use fst::{IntoStreamer, Map, MapBuilder, Streamer};
use log::info;
use memmap2::Mmap;

use crate::artifact;
use crate::corpus::UnigramCounts;
use crate::errors::{GramError, Result};
use crate::weight;
use crate::weight_array::WeightArray;

/// Id reserved for out-of-vocabulary terms.
pub const OOV_ID: i32 = 0;

/// Default returned by [`TermIndex::get`] callers for a missing term.
pub const MISSING: i32 = -1;

fn encode(id: i32) -> u64 {
    id as u32 as u64
}

fn decode(value: u64) -> i32 {
    value as u32 as i32
}

/// Collects `term → id` pairs before the index is frozen.
///
/// `fst` needs keys in sorted order, so pairs are staged in a `BTreeMap`.
#[derive(Clone, Debug, Default)]
pub struct TermIndexBuilder {
    entries: BTreeMap<String, i32>,
}

impl TermIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `term → id`, returning the id it replaced if the term was
    /// already present.
    pub fn put(&mut self, term: impl Into<String>, id: i32) -> Option<i32> {
        self.entries.insert(term.into(), id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self) -> Result<TermIndex> {
        let mut builder = MapBuilder::memory();
        for (term, &id) in &self.entries {
            builder.insert(term, encode(id))?;
        }
        let map = Map::new(builder.into_inner()?)?;
        Ok(TermIndex { map })
    }
}

/// Read-only term index.
pub struct TermIndex<D = Vec<u8>> {
    map: Map<D>,
}

impl<D: AsRef<[u8]>> TermIndex<D> {
    /// Wraps serialized index bytes.
    pub fn from_bytes(data: D, path: &Path) -> Result<Self> {
        let map = Map::new(data).map_err(|e| GramError::invalid(path, e.to_string()))?;
        Ok(Self { map })
    }

    /// Id of `term`, or `default` when it is not indexed.
    pub fn get(&self, term: &str, default: i32) -> i32 {
        self.map.get(term).map(decode).unwrap_or(default)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.map.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All `(term, id)` pairs in ascending byte order of the term.
    pub fn entries(&self) -> Vec<(String, i32)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stream = self.map.stream();
        while let Some((key, value)) = stream.next() {
            out.push((String::from_utf8_lossy(key).into_owned(), decode(value)));
        }
        out
    }

    /// Terms starting with `prefix`, with their ids.
    pub fn with_prefix(&self, prefix: &str) -> Vec<(String, i32)> {
        let mut out = Vec::new();
        let mut stream = self.map.range().ge(prefix).into_stream();
        while let Some((key, value)) = stream.next() {
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            out.push((String::from_utf8_lossy(key).into_owned(), decode(value)));
        }
        out
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.map.as_fst().as_bytes()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        artifact::write_artifact(path, self.as_bytes())
    }
}

impl TermIndex<Mmap> {
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_bytes(artifact::map_artifact(path)?, path)
    }
}

fn assign_id(term: &str, next: usize) -> Result<i32> {
    i32::try_from(next).map_err(|_| GramError::IdOverflow {
        term: term.to_string(),
        id: next,
    })
}

/// Term index and weight array built together from a unigram corpus.
pub struct Vocabulary {
    pub index: TermIndex,
    pub weights: WeightArray,
}

impl Vocabulary {
    /// Assigns ids `1..=N` in ascending term order and records each term's
    /// cost under its id. `path` names the corpus in errors.
    pub fn from_unigrams(freqs: &UnigramCounts, path: &Path) -> Result<Self> {
        let weighted = weight::transform(freqs, path)?;

        let mut builder = TermIndexBuilder::new();
        let mut weights = WeightArray::new();
        for (term, w) in weighted {
            let id = assign_id(term, weights.next_id())?;
            builder.put(term.as_str(), id);
            weights.push(w);
        }

        let index = builder.build()?;
        Ok(Self { index, weights })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Writes the weight array, then the index. Stops at the first failure.
    pub fn save(&self, index_path: &Path, weights_path: &Path) -> Result<()> {
        self.weights.save(weights_path)?;
        self.index.save(index_path)?;
        info!(
            "saved {} terms to {} and {}",
            self.len(),
            index_path.display(),
            weights_path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use crate::corpus::{read_unigrams, CorpusOptions};

    fn vocab(text: &str) -> Vocabulary {
        let freqs = read_unigrams(
            Cursor::new(text.as_bytes()),
            Path::new("test"),
            &CorpusOptions::default(),
        )
        .unwrap();
        Vocabulary::from_unigrams(&freqs, Path::new("test")).unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let mut builder = TermIndexBuilder::new();
        assert_eq!(builder.put("hello", 5), None);
        assert_eq!(builder.put("world", 9), None);
        assert_eq!(builder.put("hello", 6), Some(5));
        let index = builder.build().unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("hello", MISSING), 6);
        assert_eq!(index.get("world", MISSING), 9);
        assert_eq!(index.get("absent", MISSING), MISSING);
        assert_eq!(index.get("absent", 42), 42);
        assert!(index.contains("world"));
    }

    #[test]
    fn test_negative_values_survive() {
        let mut builder = TermIndexBuilder::new();
        builder.put("neg", -7);
        builder.put("max", i32::MAX);
        let index = builder.build().unwrap();
        assert_eq!(index.get("neg", 0), -7);
        assert_eq!(index.get("max", 0), i32::MAX);
    }

    #[test]
    fn test_cat_dog_scenario() {
        let vocab = vocab("cat 3\ndog 1\n");
        assert_eq!(vocab.index.get("cat", MISSING), 1);
        assert_eq!(vocab.index.get("dog", MISSING), 2);
        assert_eq!(vocab.weights.len(), 3);
        assert_eq!(vocab.weights.get(0), Some(0.0));
        assert!((vocab.weights.get(1).unwrap() - 0.287_682).abs() < 1e-5);
        assert!((vocab.weights.get(2).unwrap() - 1.386_294).abs() < 1e-5);
    }

    #[test]
    fn test_ids_follow_term_order() {
        let vocab = vocab("pear 1\napple 5\n\u{732b} 2\nbanana 1\nApple 1\n");
        let entries = vocab.index.entries();
        assert_eq!(entries.len(), 5);
        for (i, (_, id)) in entries.iter().enumerate() {
            assert_eq!(*id as usize, i + 1);
        }
        for pair in entries.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
        assert_eq!(entries[0].0, "Apple");
        assert_eq!(entries[4].0, "\u{732b}");
        assert!(!entries.iter().any(|(_, id)| *id == OOV_ID));
    }

    #[test]
    fn test_assign_id_range() {
        assert_eq!(assign_id("a", 1).unwrap(), 1);
        assert_eq!(assign_id("a", i32::MAX as usize).unwrap(), i32::MAX);
        let next = i32::MAX as usize + 1;
        match assign_id("z", next).unwrap_err() {
            GramError::IdOverflow { term, id } => {
                assert_eq!(term, "z");
                assert_eq!(id, next);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_corpus_builds_nothing() {
        let freqs = UnigramCounts::new();
        assert!(matches!(
            Vocabulary::from_unigrams(&freqs, Path::new("empty")),
            Err(GramError::EmptyCorpus { .. })
        ));
    }

    #[test]
    fn test_with_prefix() {
        let vocab = vocab("car 1\ncart 1\ncat 1\ndog 1\n");
        let hits: Vec<String> = vocab
            .index
            .with_prefix("car")
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        assert_eq!(hits, ["car", "cart"]);
        assert!(vocab.index.with_prefix("z").is_empty());
    }

    #[test]
    fn test_save_and_load_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.idx");
        let b = dir.path().join("b.idx");
        let wa = dir.path().join("a.bin");
        let wb = dir.path().join("b.bin");
        vocab("b 2\na 1\nc 3\n").save(&a, &wa).unwrap();
        vocab("c 3\na 1\nb 2\n").save(&b, &wb).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
        assert_eq!(std::fs::read(&wa).unwrap(), std::fs::read(&wb).unwrap());

        let loaded = TermIndex::load(&a).unwrap();
        assert_eq!(loaded.get("a", MISSING), 1);
        assert_eq!(loaded.get("c", MISSING), 3);
        assert_eq!(loaded.get("d", MISSING), MISSING);
    }

    #[test]
    fn test_load_garbage_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.idx");
        std::fs::write(&path, b"not an fst").unwrap();
        assert!(matches!(
            TermIndex::load(&path),
            Err(GramError::InvalidArtifact { .. })
        ));
    }
}
