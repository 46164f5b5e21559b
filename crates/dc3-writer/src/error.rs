//! Writer-local errors, converging into [`BuildError::UploadError`] per §7
//! ("the finished cube store ... could not be written to the destination").

use dc3_common::BuildError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("failed to write chunked store: {0}")]
    StoreWrite(String),

    #[error("failed to package distribution archive: {0}")]
    Packaging(String),

    #[error(transparent)]
    ChunkPlan(#[from] dc3_chunking::ChunkPlanError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<WriterError> for BuildError {
    fn from(err: WriterError) -> Self {
        BuildError::upload(err.to_string())
    }
}
