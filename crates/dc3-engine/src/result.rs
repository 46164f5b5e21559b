//! The Build Controller's response shape (§6): what a caller gets back once
//! a build succeeds.

use serde::Serialize;

/// Mirrors the original `CubeBuildResult` the API layer serializes: the
/// destination of the cube store (or distribution archive), the preview's
/// location, and the preview bytes themselves (base64) for callers that want
/// to render it inline without a second fetch.
#[derive(Debug, Clone, Serialize)]
pub struct CubeBuildResult {
    pub datacube_url: String,
    pub preview_url: Option<String>,
    pub preview: Option<String>,
}
