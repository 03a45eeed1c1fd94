//! The `dict` build: a standalone term index from `term value` lines.

use std::io::BufRead;
use std::path::Path;

use log::{info, warn};

use crate::corpus::{self, CorpusOptions};
use crate::errors::Result;
use crate::term_index::{TermIndex, TermIndexBuilder};

/// Outcome of a dictionary build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DictSummary {
    /// Records read, duplicates included.
    pub words: usize,
    /// Distinct terms in the saved index.
    pub terms: usize,
    pub skipped: u64,
}

fn parse_entry(line: &str, options: &CorpusOptions) -> Option<(String, i32)> {
    let mut fields = line.split_whitespace();
    let term = fields.next()?;
    let value = fields.next()?.parse().ok()?;
    Some((options.term(term), value))
}

/// Reads `term value` records into an index. A repeated term keeps its last
/// value.
pub fn read_dict<R: BufRead>(
    reader: R,
    path: &Path,
    options: &CorpusOptions,
) -> Result<(TermIndex, DictSummary)> {
    let mut builder = TermIndexBuilder::new();
    let mut words = 0;

    let skipped = corpus::scan_lines(reader, path, |line| match parse_entry(line, options) {
        Some((term, value)) => {
            if let Some(old) = builder.put(term.as_str(), value) {
                warn!("{}: {term:?} redefined ({old} -> {value})", path.display());
            }
            words += 1;
            true
        }
        None => false,
    })?;

    let terms = builder.len();
    let index = builder.build()?;
    Ok((
        index,
        DictSummary {
            words,
            terms,
            skipped,
        },
    ))
}

/// Builds the index from `input` and saves it to `output`.
pub fn make_dict(input: &Path, output: &Path, options: &CorpusOptions) -> Result<DictSummary> {
    let (index, summary) = read_dict(corpus::open_corpus(input)?, input, options)?;
    index.save(output)?;
    info!(
        "saved {} terms from {} to {}",
        summary.terms,
        input.display(),
        output.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use crate::errors::GramError;
    use crate::term_index::MISSING;

    #[test]
    fn test_read_dict() {
        let text = "hello 10\nworld -3\nbroken\nhello 11\nnope x\n";
        let (index, summary) = read_dict(
            Cursor::new(text.as_bytes()),
            Path::new("dict.txt"),
            &CorpusOptions::default(),
        )
        .unwrap();
        assert_eq!(
            summary,
            DictSummary {
                words: 3,
                terms: 2,
                skipped: 2
            }
        );
        assert_eq!(index.get("hello", MISSING), 11);
        assert_eq!(index.get("world", MISSING), -3);
        assert_eq!(index.get("broken", MISSING), MISSING);
    }

    #[test]
    fn test_non_utf8_line_is_skipped() {
        let (index, summary) = read_dict(
            Cursor::new(&b"a 1\n\xff 2\nb 3\n"[..]),
            Path::new("dict.txt"),
            &CorpusOptions::default(),
        )
        .unwrap();
        assert_eq!(summary.words, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(index.get("a", MISSING), 1);
        assert_eq!(index.get("b", MISSING), 3);
    }

    #[test]
    fn test_make_dict_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("words.txt");
        let output = dir.path().join("words.idx");
        std::fs::write(&input, "b 2\na 1\nc 3\n").unwrap();

        let summary = make_dict(&input, &output, &CorpusOptions::default()).unwrap();
        assert_eq!(summary.words, 3);

        let index = TermIndex::load(&output).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("a", MISSING), 1);
        assert_eq!(index.get("c", MISSING), 3);
    }

    #[test]
    fn test_make_dict_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.idx");
        let err = make_dict(
            &dir.path().join("missing.txt"),
            &output,
            &CorpusOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GramError::Io { .. }));
        assert!(!output.exists());
    }
}
