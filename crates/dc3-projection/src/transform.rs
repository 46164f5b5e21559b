//! Generic CRS-to-CRS reprojection (C1 polygon reprojection, C3 step 5 band
//! resampling support) via PROJ, as opposed to the hand-rolled per-sensor
//! math in [`crate::lambert`] and [`crate::geostationary`], which only cover
//! specific known grids.

use dc3_common::Crs;
use geo::{Coord, LineString, Polygon};
use proj::Proj;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to build transform from {src} to {dst}: {source}")]
    ProjSetup {
        src: String,
        dst: String,
        #[source]
        source: proj::ProjCreateError,
    },

    #[error("failed to transform coordinate: {0}")]
    ProjConvert(#[from] proj::ProjError),
}

/// Reproject a single (x, y) point from `src_crs` to `dst_crs`.
pub fn transform_point(
    src_crs: &Crs,
    dst_crs: &Crs,
    x: f64,
    y: f64,
) -> Result<(f64, f64), TransformError> {
    let proj =
        Proj::new_known_crs(src_crs.as_str(), dst_crs.as_str(), None).map_err(|source| {
            TransformError::ProjSetup {
                src: src_crs.to_string(),
                dst: dst_crs.to_string(),
                source,
            }
        })?;
    let (tx, ty) = proj.convert((x, y))?;
    Ok((tx, ty))
}

/// Reproject a polygon's exterior ring from `src_crs` to `dst_crs`.
///
/// No densification is performed (the spec does not require it); callers
/// that need curvature fidelity across large reprojected spans should
/// densify the ring before calling this.
pub fn transform_polygon(
    src_crs: &Crs,
    dst_crs: &Crs,
    polygon: &Polygon<f64>,
) -> Result<Polygon<f64>, TransformError> {
    let proj =
        Proj::new_known_crs(src_crs.as_str(), dst_crs.as_str(), None).map_err(|source| {
            TransformError::ProjSetup {
                src: src_crs.to_string(),
                dst: dst_crs.to_string(),
                source,
            }
        })?;

    let mut coords = Vec::with_capacity(polygon.exterior().coords().count());
    for c in polygon.exterior().coords() {
        let (tx, ty) = proj.convert((c.x, c.y))?;
        coords.push(Coord { x: tx, y: ty });
    }
    Ok(Polygon::new(LineString::from(coords), vec![]))
}
