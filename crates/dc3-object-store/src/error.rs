//! Storage-local errors, converted into [`BuildError`] at the same seam
//! every other crate-local error enum uses.

use dc3_common::BuildError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to build object store client: {0}")]
    ClientSetup(String),

    #[error("failed to read {uri}: {detail}")]
    ReadFailed { uri: String, detail: String },

    #[error("failed to write {path}: {detail}")]
    WriteFailed { path: String, detail: String },

    #[error("failed to walk local directory {path}: {detail}")]
    WalkFailed { path: String, detail: String },
}

impl From<StorageError> for BuildError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::ClientSetup(_) => BuildError::internal(err.to_string()),
            StorageError::ReadFailed { .. } => BuildError::download("read failed", err.to_string()),
            StorageError::WriteFailed { .. } | StorageError::WalkFailed { .. } => {
                BuildError::upload(err.to_string())
            }
        }
    }
}
