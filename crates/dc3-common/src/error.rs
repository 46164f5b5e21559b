//! The workspace-wide error taxonomy.
//!
//! Every crate-local error enum (staging, algebra, expr, writer, ...)
//! converts into `BuildError` via `From`, the same way `IngestionError`
//! collapses into an outer `anyhow::Error` catch-all in the teacher crate.
//! `BuildError` is the type a `BuildController` reports to a caller.

use thiserror::Error;

pub type BuildResult<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    /// The build request itself is malformed: an unparsable ROI, an unknown
    /// product type, a band expression referencing an alias that isn't part
    /// of the request, and so on.
    #[error("bad request: {detail}")]
    BadRequest { detail: String },

    /// A granule could not be staged: fetch failure, decode failure, or a
    /// raster driver rejecting the archive outright.
    #[error("download failed: {title}: {detail}")]
    DownloadError { title: String, detail: String },

    /// Dataset algebra (C4) or orchestration (C5) failed to combine staged
    /// granules into a consistent cube: incompatible schemas, a degenerate
    /// master grid, or an intersection classification that cannot be resolved.
    #[error("mosaicking failed: {detail}")]
    MosaickingError { detail: String },

    /// The finished cube (or its preview/distribution archive) could not be
    /// written to the destination object store.
    #[error("upload failed: {detail}")]
    UploadError { detail: String },

    /// Anything else: scratch I/O, cache corruption, a bug.
    #[error("internal error: {detail}")]
    InternalError { detail: String },
}

impl BuildError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadRequest {
            detail: detail.into(),
        }
    }

    pub fn download(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::DownloadError {
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn mosaicking(detail: impl Into<String>) -> Self {
        Self::MosaickingError {
            detail: detail.into(),
        }
    }

    pub fn upload(detail: impl Into<String>) -> Self {
        Self::UploadError {
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::InternalError {
            detail: detail.into(),
        }
    }

    /// A short machine-readable tag, stable across versions, for logs and
    /// for the `CubeBuildResult` error field.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::BadRequest { .. } => "bad_request",
            BuildError::DownloadError { .. } => "download_error",
            BuildError::MosaickingError { .. } => "mosaicking_error",
            BuildError::UploadError { .. } => "upload_error",
            BuildError::InternalError { .. } => "internal_error",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            BuildError::BadRequest { .. } => 400,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(err: std::io::Error) -> Self {
        BuildError::InternalError {
            detail: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BuildError {
    fn from(err: serde_json::Error) -> Self {
        BuildError::BadRequest {
            detail: format!("malformed JSON: {err}"),
        }
    }
}

impl From<anyhow::Error> for BuildError {
    fn from(err: anyhow::Error) -> Self {
        BuildError::InternalError {
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(BuildError::bad_request("x").status_code(), 400);
        assert_eq!(BuildError::internal("x").status_code(), 500);
        assert_eq!(BuildError::mosaicking("x").kind(), "mosaicking_error");
    }
}
