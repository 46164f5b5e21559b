//! Dataset Algebra (C4): bounds, intersection classification, schema-aware
//! merge, and the recursive overlap mosaic that the Orchestrator (C5) folds
//! granules and per-timestamp mosaics through.

pub mod dataset;
pub mod grid2d;
pub mod mosaic;

pub use dataset::Dataset;
pub use grid2d::Grid2D;
pub use mosaic::{intersect, merge_datasets, mosaic, IntersectionType};
