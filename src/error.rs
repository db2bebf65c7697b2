//! Error type for the I/O boundaries of the crate: model checkpoints and score history export.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to {operation} '{}': {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("score history export error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn io(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
