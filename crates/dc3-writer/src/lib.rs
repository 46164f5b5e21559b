//! Cube Writer (C8): persists the finished, enriched cube to a chunked
//! output store and, when the request asks for it, packages that store into
//! a distribution archive.
//!
//! Grounded on `crates/grid-processor/src/writer/zarr_writer.rs` for the
//! chunked-store side and `original_source/datacube/core/pivot/format.py`
//! for the archive side.

pub mod error;
pub mod pivot;
pub mod store;

pub use error::WriterError;
pub use pivot::{package_pivot_archive, PivotOutcome};
pub use store::{write_cube_store, WriteOutcome};
