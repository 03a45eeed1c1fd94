//! Consistency checks over a built set of gram artifacts.

use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::artifact::ArtifactPaths;
use crate::bigram;
use crate::errors::Result;
use crate::static_table::StaticHashTable;
use crate::term_index::{TermIndex, MISSING};
use crate::weight_array::{WeightArray, OOV_WEIGHT};

#[derive(Clone, Debug, Default)]
pub struct CheckReport {
    pub terms: usize,
    pub bigram_pairs: usize,
    pub sampled: usize,
    pub failures: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, name: &str, errors: usize, first: Option<String>) {
        if errors > 0 {
            let example = first.unwrap_or_default();
            self.failures.push(format!("{name}: {errors} errors, e.g. {example}"));
        }
    }
}

/// Loads the artifacts at `paths` and checks the invariants a consumer
/// relies on. `samples` random terms (from `seed`) are also looked up end to
/// end.
///
/// Failing checks are collected in the report. Only I/O or decoding
/// problems are returned as errors.
pub fn check_artifacts(paths: &ArtifactPaths, samples: usize, seed: u64) -> Result<CheckReport> {
    let index = TermIndex::load(&paths.index)?;
    let weights = WeightArray::load(&paths.weights)?;
    let table = StaticHashTable::load(&paths.bigram)?;
    let entries = index.entries();
    let n = entries.len();

    let mut report = CheckReport {
        terms: n,
        bigram_pairs: table.len(),
        ..CheckReport::default()
    };

    if weights.len() != n + 1 {
        report.failures.push(format!(
            "weight array has {} slots for {} terms",
            weights.len(),
            n
        ));
    }
    if weights.get(0) != Some(OOV_WEIGHT) {
        report.failures.push("slot 0 is not the OOV weight".to_string());
    }

    // Ids must be exactly 1..=n in key order.
    let mut errors = 0;
    let mut first = None;
    for (i, (term, id)) in entries.iter().enumerate() {
        if *id as i64 != i as i64 + 1 {
            errors += 1;
            first.get_or_insert_with(|| format!("{term:?} has id {id}, expected {}", i + 1));
        }
    }
    report.record("dense ids", errors, first);

    let mut errors = 0;
    let mut first = None;
    for (id, w) in weights.as_slice().iter().enumerate().skip(1) {
        if !w.is_finite() {
            errors += 1;
            first.get_or_insert_with(|| format!("id {id} has weight {w}"));
        }
    }
    report.record("finite weights", errors, first);

    let mut errors = 0;
    let mut first = None;
    let in_vocab = |id: i32| id > 0 && (id as usize) <= n;
    let mut stored = 0;
    for (key, value) in table.iter() {
        stored += 1;
        let (left, right) = bigram::unpack(key);
        if !in_vocab(left) || !in_vocab(right) || !value.is_finite() {
            errors += 1;
            first.get_or_insert_with(|| format!("key ({left}, {right}) -> {value}"));
        }
    }
    report.record("bigram keys", errors, first);
    if stored != table.len() {
        report.failures.push(format!(
            "bigram table header says {} pairs, found {stored}",
            table.len()
        ));
    }

    if n > 0 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut errors = 0;
        let mut first = None;
        for _ in 0..samples {
            let (term, id) = &entries[rng.gen_range(0..n)];
            let found = index.get(term, MISSING);
            if found != *id || weights.get(found).is_none() {
                errors += 1;
                first.get_or_insert_with(|| format!("{term:?} resolved to {found}"));
            }
        }
        report.sampled = samples;
        report.record("sampled lookups", errors, first);
    }

    info!(
        "checked {} terms and {} bigram pairs: {} failures",
        report.terms,
        report.bigram_pairs,
        report.failures.len()
    );
    Ok(report)
}
