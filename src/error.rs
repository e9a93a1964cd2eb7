use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A malformed address, prefix or input line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("illegal ip: {0:?}")]
    InvalidAddress(String),
    #[error("illegal cidr: {0:?}")]
    InvalidCidr(String),
    #[error("illegal line #{line}: {content:?}")]
    InvalidLine { line: usize, content: String },
}

/// Failure while bulk loading a tree from a file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Read failure on a source that has no path, see [`crate::Loader::load_reader`].
    #[error("failed to read input: {0}")]
    Read(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
