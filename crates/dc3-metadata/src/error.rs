//! Metadata-local errors, converted into [`BuildError`] at the same seam
//! every other crate-local error enum uses.

use dc3_common::BuildError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cube has no variables to compute fill_ratio over")]
    EmptyCube,

    #[error("no cached raster record for {uri}")]
    MissingCacheRecord { uri: String },

    #[error("band '{band}' expression could not be parsed: {detail}")]
    BadExpression { band: String, detail: String },

    #[error("failed to reproject raster bounds for {uri}: {detail}")]
    ReprojectionFailed { uri: String, detail: String },

    #[error("request ROI could not be parsed: {0}")]
    BadRoi(String),

    #[error("chunk plan could not be resolved: {0}")]
    BadChunkPlan(String),
}

impl From<MetadataError> for BuildError {
    fn from(err: MetadataError) -> Self {
        match &err {
            MetadataError::EmptyCube
            | MetadataError::BadExpression { .. }
            | MetadataError::BadRoi(_)
            | MetadataError::BadChunkPlan(_) => BuildError::bad_request(err.to_string()),
            MetadataError::MissingCacheRecord { .. } | MetadataError::ReprojectionFailed { .. } => {
                BuildError::mosaicking(err.to_string())
            }
        }
    }
}
