//! Frequency aggregation over line-oriented count corpora.
//!
//! Unigram sources hold `term count` lines and bigram sources hold
//! `left right count` lines. Lines that do not parse are skipped and only
//! counted; I/O failures abort the whole read.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use flate2::read::GzDecoder;
use log::{debug, info};
use unicode_normalization::UnicodeNormalization;

use crate::errors::{GramError, Result};

/// Numeric type a corpus count is parsed into.
pub trait Count: Copy + Default + FromStr {
    fn as_f64(self) -> f64;

    /// Whether a parsed value may enter the aggregation. Only strictly
    /// positive counts have a finite cost.
    fn is_usable(self) -> bool;

    /// Sum of `self` and `other`, or `None` if it leaves the finite range.
    fn checked_add(self, other: Self) -> Option<Self>;
}

impl Count for f64 {
    fn as_f64(self) -> f64 {
        self
    }

    fn is_usable(self) -> bool {
        self.is_finite() && self > 0.0
    }

    fn checked_add(self, other: Self) -> Option<Self> {
        Some(self + other).filter(|sum| sum.is_finite())
    }
}

impl Count for i64 {
    fn as_f64(self) -> f64 {
        self as f64
    }

    fn is_usable(self) -> bool {
        self > 0
    }

    fn checked_add(self, other: Self) -> Option<Self> {
        i64::checked_add(self, other)
    }
}

/// Accumulated counts keyed in ascending order, plus the grand total.
#[derive(Clone, Debug, PartialEq)]
pub struct Frequencies<K, C> {
    counts: BTreeMap<K, C>,
    total: C,
    skipped: u64,
}

pub type UnigramCounts = Frequencies<String, f64>;
pub type BigramCounts = Frequencies<(String, String), i64>;

impl<K: Ord, C: Count> Default for Frequencies<K, C> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
            total: C::default(),
            skipped: 0,
        }
    }
}

impl<K: Ord, C: Count> Frequencies<K, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` to `key` and to the total.
    ///
    /// Returns `false`, leaving everything unchanged, when the count is not
    /// usable or either sum would overflow.
    pub fn add(&mut self, key: K, count: C) -> bool {
        if !count.is_usable() {
            return false;
        }
        let Some(total) = self.total.checked_add(count) else {
            return false;
        };
        let entry = self.counts.entry(key).or_default();
        let Some(sum) = entry.checked_add(count) else {
            return false;
        };
        *entry = sum;
        self.total = total;
        true
    }

    pub fn get(&self, key: &K) -> Option<C> {
        self.counts.get(key).copied()
    }

    pub fn total(&self) -> C {
        self.total
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of non-blank lines that were dropped as malformed.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, C)> + '_ {
        self.counts.iter().map(|(k, &c)| (k, c))
    }
}

/// Options applied to every term read from a corpus.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorpusOptions {
    /// Normalize terms to Unicode NFC before aggregation.
    pub nfc: bool,
}

impl CorpusOptions {
    pub(crate) fn term(&self, raw: &str) -> String {
        if self.nfc {
            raw.nfc().collect()
        } else {
            raw.to_string()
        }
    }
}

/// Opens a corpus file, decompressing it on the fly when it ends in `.gz`.
pub fn open_corpus(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| GramError::io(path, e))?;
    let gz = path.extension().is_some_and(|ext| ext == "gz");
    let reader: Box<dyn BufRead> = if gz {
        Box::new(BufReader::with_capacity(1 << 20, GzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(1 << 20, file))
    };
    Ok(reader)
}

fn parse_unigram(line: &str, options: &CorpusOptions) -> Option<(String, f64)> {
    let mut fields = line.split_whitespace();
    let term = fields.next()?;
    let count: f64 = fields.next()?.parse().ok()?;
    Some((options.term(term), count))
}

fn parse_bigram(line: &str, options: &CorpusOptions) -> Option<((String, String), i64)> {
    let mut fields = line.split_whitespace();
    let left = fields.next()?;
    let right = fields.next()?;
    let count: i64 = fields.next()?.parse().ok()?;
    Some(((options.term(left), options.term(right)), count))
}

/// Feeds each non-blank line of `reader` to `accept` and returns how many
/// lines were skipped, either because they are not UTF-8 or because `accept`
/// rejected them. Read errors abort with the offending `path`.
pub(crate) fn scan_lines<R, F>(mut reader: R, path: &Path, mut accept: F) -> Result<u64>
where
    R: BufRead,
    F: FnMut(&str) -> bool,
{
    let mut buf = Vec::new();
    let mut line_no = 0u64;
    let mut skipped = 0u64;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| GramError::io(path, e))?;
        if n == 0 {
            break;
        }
        line_no += 1;

        let Ok(line) = std::str::from_utf8(&buf) else {
            debug!("{}:{line_no}: skipping non UTF-8 line", path.display());
            skipped += 1;
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        if !accept(line) {
            debug!("{}:{line_no}: skipping malformed line", path.display());
            skipped += 1;
        }
    }

    Ok(skipped)
}

fn aggregate<R, K, C, F>(reader: R, path: &Path, parse: F) -> Result<Frequencies<K, C>>
where
    R: BufRead,
    K: Ord,
    C: Count,
    F: Fn(&str) -> Option<(K, C)>,
{
    let mut freqs = Frequencies::new();
    let skipped = scan_lines(reader, path, |line| match parse(line) {
        Some((key, count)) => freqs.add(key, count),
        None => false,
    })?;
    freqs.skipped = skipped;
    Ok(freqs)
}

/// Aggregates `term count` records from `reader`. `path` is only used in
/// diagnostics.
pub fn read_unigrams<R: BufRead>(
    reader: R,
    path: &Path,
    options: &CorpusOptions,
) -> Result<UnigramCounts> {
    aggregate(reader, path, |line| parse_unigram(line, options))
}

/// Aggregates `left right count` records from `reader`.
pub fn read_bigrams<R: BufRead>(
    reader: R,
    path: &Path,
    options: &CorpusOptions,
) -> Result<BigramCounts> {
    aggregate(reader, path, |line| parse_bigram(line, options))
}

pub fn load_unigrams(path: &Path, options: &CorpusOptions) -> Result<UnigramCounts> {
    let freqs = read_unigrams(open_corpus(path)?, path, options)?;
    info!(
        "loaded {} unigram entries from {} (total {}, {} lines skipped)",
        freqs.len(),
        path.display(),
        freqs.total(),
        freqs.skipped()
    );
    Ok(freqs)
}

pub fn load_bigrams(path: &Path, options: &CorpusOptions) -> Result<BigramCounts> {
    let freqs = read_bigrams(open_corpus(path)?, path, options)?;
    info!(
        "loaded {} bigram entries from {} (total {}, {} lines skipped)",
        freqs.len(),
        path.display(),
        freqs.total(),
        freqs.skipped()
    );
    Ok(freqs)
}
