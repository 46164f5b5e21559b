//! Orchestrator-local validation errors, converted into [`BuildError`] at the
//! same seam every other crate-local error enum uses.

use dc3_common::BuildError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("raster group list is empty")]
    EmptyGroups,

    #[error("raster file {uri} has product type {source}/{format} which is not bound to any alias")]
    UnknownAlias {
        uri: String,
        source: String,
        format: String,
    },

    #[error("band '{band}' expression could not be parsed: {detail}")]
    BadExpression { band: String, detail: String },

    #[error("granule store at {path} has no coordinate points on one of its axes")]
    DegenerateGrid { path: String },
}

impl From<OrchestratorError> for BuildError {
    fn from(err: OrchestratorError) -> Self {
        match &err {
            OrchestratorError::EmptyGroups
            | OrchestratorError::UnknownAlias { .. }
            | OrchestratorError::BadExpression { .. } => BuildError::bad_request(err.to_string()),
            OrchestratorError::DegenerateGrid { .. } => BuildError::mosaicking(err.to_string()),
        }
    }
}
