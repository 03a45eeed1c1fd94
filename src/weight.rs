//! Negative log-probability weights.

use std::path::Path;

use crate::corpus::{Count, Frequencies};
use crate::errors::{GramError, Result};

/// Cost of an event seen `count` times out of `total`: `-ln(count / total)`.
///
/// Higher counts give smaller costs.
pub fn cost(count: f64, total: f64) -> f64 {
    -(count / total).ln()
}

/// Returns the corpus total as a usable denominator.
///
/// `path` names the corpus in the error when the total is not positive.
pub fn denominator<K: Ord, C: Count>(freqs: &Frequencies<K, C>, path: &Path) -> Result<f64> {
    let total = freqs.total().as_f64();
    if total > 0.0 {
        Ok(total)
    } else {
        Err(GramError::EmptyCorpus {
            path: path.to_path_buf(),
        })
    }
}

/// Converts every aggregated count into its cost, keeping ascending key
/// order.
pub fn transform<'a, K: Ord, C: Count>(
    freqs: &'a Frequencies<K, C>,
    path: &Path,
) -> Result<Vec<(&'a K, f32)>> {
    let total = denominator(freqs, path)?;
    Ok(freqs
        .iter()
        .map(|(key, count)| (key, cost(count.as_f64(), total) as f32))
        .collect())
}
