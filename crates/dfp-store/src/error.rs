//! Error types for the on-disk piece store.

use std::path::PathBuf;

use thiserror::Error;

/// Store operation failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The folder component escapes the user directory or is otherwise
    /// unusable as a relative path.
    #[error("invalid folder path {folder:?}")]
    InvalidPath { folder: String },

    #[error("folder already exists: {path}")]
    FolderExists { path: PathBuf },

    #[error("piece .{name}.{id} not found")]
    PieceNotFound { name: String, id: u8 },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
