//! Bigram cost table keyed by packed term-id pairs.

use std::path::Path;

use log::{debug, info, warn};

use crate::corpus::BigramCounts;
use crate::errors::Result;
use crate::static_table::StaticHashTable;
use crate::term_index::{TermIndex, MISSING};
use crate::weight;

/// Packs two term ids into one table key: `(left << 32) | right`.
///
/// Both ids must lie in `[1, 2^31)`.
pub fn pack(left_id: i32, right_id: i32) -> i64 {
    debug_assert!(left_id > 0 && right_id > 0);
    ((left_id as i64) << 32) | right_id as i64
}

/// Splits a packed key back into `(left_id, right_id)`.
pub fn unpack(key: i64) -> (i32, i32) {
    ((key >> 32) as i32, (key & 0xFFFF_FFFF) as i32)
}

/// A finished bigram table and the number of pairs it retained.
pub struct BigramTable {
    pub table: StaticHashTable,
    /// Pairs dropped because a term had no id.
    pub dropped: usize,
}

impl BigramTable {
    /// Resolves every aggregated pair through `index` and builds the table
    /// from the pairs whose terms are both indexed.
    ///
    /// Costs are taken against the total over all pairs, dropped ones
    /// included. An empty corpus yields an empty table. `path` names the
    /// corpus in errors.
    pub fn build<D: AsRef<[u8]>>(
        freqs: &BigramCounts,
        index: &TermIndex<D>,
        path: &Path,
    ) -> Result<Self> {
        if freqs.is_empty() {
            warn!("{} has no bigram entries", path.display());
            return Ok(Self {
                table: StaticHashTable::build(&[])?,
                dropped: 0,
            });
        }
        let total = weight::denominator(freqs, path)?;

        let mut pairs = Vec::with_capacity(freqs.len());
        let mut dropped = 0;
        for ((left, right), count) in freqs.iter() {
            let left_id = index.get(left, MISSING);
            let right_id = index.get(right, MISSING);
            if left_id > 0 && right_id > 0 {
                let cost = weight::cost(count as f64, total) as f32;
                pairs.push((pack(left_id, right_id), cost));
            } else {
                debug!("dropping bigram ({left}, {right}): term not in vocabulary");
                dropped += 1;
            }
        }

        let table = StaticHashTable::build(&pairs)?;
        info!(
            "built bigram table: {} pairs kept, {} dropped, {} slots",
            table.len(),
            dropped,
            table.slots()
        );
        Ok(Self { table, dropped })
    }

    /// Number of pairs stored in the table.
    pub fn retained(&self) -> usize {
        self.table.len()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.table.save(path)
    }
}
