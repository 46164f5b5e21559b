//! Geometry & Grid (C1): ROI parsing, CRS reprojection, and grid completion.
//!
//! Generic CRS-to-CRS transforms go through PROJ ([`transform`]); the
//! hand-rolled [`lambert`] and [`geostationary`] projections remain for
//! source archives whose driver knows it is dealing with one of those
//! specific sensor grids and wants to skip a PROJ round-trip.

pub mod geostationary;
pub mod grid;
pub mod lambert;
pub mod roi;
pub mod transform;

pub use geostationary::Geostationary;
pub use grid::complete_grid;
pub use lambert::LambertConformal;
pub use roi::{bbox_to_polygon, parse_roi, polygon_bounds, RoiError};
pub use transform::{transform_point, transform_polygon, TransformError};
