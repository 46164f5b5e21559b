//! Staging-local error type, grounded on the teacher's `IngestionError`
//! (`crates/ingestion/src/error.rs`): a `thiserror` enum with `#[from]`
//! conversions plus a catch-all, converging at the edge into the shared
//! [`dc3_common::BuildError`] taxonomy (§7: every C3 failure is a
//! `DownloadError` carrying the raster URI as title).

use dc3_common::BuildError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to open input archive: {0}")]
    Open(#[source] std::io::Error),

    #[error("malformed archive: {0}")]
    Archive(String),

    #[error("manifest entry not found in archive")]
    ManifestMissing,

    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] quick_xml::DeError),

    #[error("acquisition timestamp missing from manifest")]
    MissingTimestamp,

    #[error("no product type decoder registered for {source}/{format}")]
    UnknownProductType { source: String, format: String },

    #[error("subband '{0}' not present in archive")]
    SubbandMissing(String),

    #[error("no resolution variant available for subband '{0}'")]
    NoResolutionVariant(String),

    #[error("decoded band has wrong element count: expected {expected}, got {got}")]
    BadPixelCount { expected: usize, got: usize },

    #[error("ROI does not intersect raster bounds")]
    EmptyIntersection,

    #[error("CRS reprojection failed: {0}")]
    Transform(#[from] dc3_projection::TransformError),

    #[error("failed to parse source CRS: {0}")]
    CrsParse(#[from] dc3_common::CrsParseError),

    #[error("granule store write failed: {0}")]
    StoreWrite(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StagingError {
    /// Lift into the shared error taxonomy, tagging the raster URI as the
    /// error's title per §7.
    pub fn into_build_error(self, uri: &str) -> BuildError {
        BuildError::download(uri.to_string(), self.to_string())
    }
}
