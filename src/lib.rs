//! Builds the binary language-model artifacts a segmenter needs for unigram
//! and bigram cost lookups.
//!
//! A gram build produces three files:
//!
//! - `unigram.idx`: an `fst` map from term to a dense id (`1..=N`, ascending
//!   term order; 0 is out-of-vocabulary)
//! - `unigram.bin`: little-endian `f32` costs indexed by id
//! - `bigram.bin`: a [`static_table::StaticHashTable`] from packed id pairs
//!   to `f32` costs
//!
//! Every cost is `-ln(count / total)` over its own corpus.

pub mod artifact;
pub mod bigram;
pub mod check;
pub mod corpus;
pub mod dict;
pub mod errors;
pub mod gram;
pub mod model;
pub mod static_table;
pub mod term_index;
pub mod weight;
pub mod weight_array;

pub use crate::errors::{GramError, Result};
pub use crate::gram::{make_gram, GramConfig, GramSummary};
pub use crate::model::GramModel;
