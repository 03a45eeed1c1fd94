//! Writing and mapping the on-disk artifacts.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tempfile::NamedTempFile;

use crate::errors::{GramError, Result};

pub const UNIGRAM_INDEX_FILE: &str = "unigram.idx";
pub const UNIGRAM_DATA_FILE: &str = "unigram.bin";
pub const BIGRAM_FILE: &str = "bigram.bin";

/// Locations of the three artifacts produced by a gram build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub index: PathBuf,
    pub weights: PathBuf,
    pub bigram: PathBuf,
}

impl ArtifactPaths {
    /// Conventional file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            index: dir.join(UNIGRAM_INDEX_FILE),
            weights: dir.join(UNIGRAM_DATA_FILE),
            bigram: dir.join(BIGRAM_FILE),
        }
    }
}

/// Writes `bytes` to `path`.
///
/// The payload goes to a temporary file next to `path` and is renamed into
/// place once fully flushed, so `path` is either the old file or the complete
/// new one. The temporary file is removed on every error path.
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| GramError::io(path, e))?;

    let temp = NamedTempFile::new_in(parent).map_err(|e| GramError::io(path, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        writer.write_all(bytes).map_err(|e| GramError::io(path, e))?;
        writer.flush().map_err(|e| GramError::io(path, e))?;
    }
    temp.persist(path).map_err(|e| GramError::io(path, e.error))?;
    Ok(())
}

/// Memory-maps an artifact for reading.
pub fn map_artifact(path: &Path) -> Result<Mmap> {
    let file = File::open(path).map_err(|e| GramError::io(path, e))?;
    // Artifacts are immutable once written.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| GramError::io(path, e))?;
    Ok(mmap)
}
