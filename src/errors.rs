//! Error type shared by every build stage.

use std::path::{Path, PathBuf};

/// Convenient alias for results returned by this crate.
pub type Result<T, E = GramError> = std::result::Result<T, E>;

/// Errors raised while aggregating corpora or reading and writing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum GramError {
    /// Opening, reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The corpus had no usable counts, so no probability can be derived.
    #[error("corpus {} has a non-positive total count", path.display())]
    EmptyCorpus { path: PathBuf },

    /// The term index could not be built or decoded.
    #[error(transparent)]
    Fst(#[from] fst::Error),

    /// The vocabulary grew past the largest id a packed key can hold.
    #[error("term {term:?} would get id {id}, beyond the i32 id range")]
    IdOverflow { term: String, id: usize },

    /// The static table was given the same key twice, or a reserved key.
    #[error("key {key:#018x} is duplicated or reserved")]
    DuplicateKey { key: i64 },

    /// The build report could not be encoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An artifact on disk is truncated or has the wrong layout.
    #[error("invalid artifact {}: {msg}", path.display())]
    InvalidArtifact { path: PathBuf, msg: String },
}

impl GramError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::InvalidArtifact {
            path: path.as_ref().to_path_buf(),
            msg: msg.into(),
        }
    }
}
