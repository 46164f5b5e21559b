//! Build Controller (C9): the single entry point that ties C1-C8 together
//! into one request-to-result pipeline.
//!
//! Grounded on `original_source/datacube/core/build_cube.py`'s `build_cube`
//! orchestration and, for the explicit-collaborator wiring style, on
//! `crates/ingestion/src/ingester.rs`.

pub mod derive;
pub mod pipeline;
pub mod preview;
pub mod result;
pub mod validate;

pub use pipeline::{run_build, BuildInputs};
pub use preview::{prepare_preview, BandPreview, NullPreviewRenderer, PreviewArtifact, PreviewRenderer, PreviewRequest};
pub use result::CubeBuildResult;
pub use validate::validate_request;
