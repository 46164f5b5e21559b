//! Dimension descriptors for the three cube axes (§4.7 "Dimensions"),
//! serialized under the `cube:dimensions` attribute key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialDimension {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub extent: (f64, f64),
    pub step: f64,
    pub reference_system: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalDimension {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub extent: (String, String),
    pub step: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeDimensions {
    pub x: SpatialDimension,
    pub y: SpatialDimension,
    pub t: TemporalDimension,
}

fn iso(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Build the x/y spatial dimension descriptor from a coordinate axis and its
/// step. `coords` is assumed non-empty (invariant 6: the master grid always
/// has at least one point per axis).
pub fn spatial_dimension(coords: &[f64], step: f64, reference_system: &str) -> SpatialDimension {
    let first = *coords.first().unwrap_or(&0.0);
    let last = *coords.last().unwrap_or(&0.0);
    SpatialDimension {
        kind: "spatial",
        extent: (first, last),
        step,
        reference_system: reference_system.to_string(),
    }
}

/// Build the temporal dimension descriptor: `step` is the mean gap between
/// consecutive group timestamps when there's more than one, else `None`.
pub fn temporal_dimension(timestamps: &[i64]) -> TemporalDimension {
    let first = *timestamps.first().unwrap_or(&0);
    let last = *timestamps.last().unwrap_or(&0);
    let n = timestamps.len();
    let step = if n > 1 {
        Some((last - first) as f64 / (n - 1) as f64)
    } else {
        None
    };
    TemporalDimension {
        kind: "temporal",
        extent: (iso(first), iso(last)),
        step,
    }
}

pub fn cube_dimensions(
    x: &[f64],
    y: &[f64],
    t: &[i64],
    dx: f64,
    dy: f64,
    target_crs: &str,
) -> CubeDimensions {
    CubeDimensions {
        x: spatial_dimension(x, dx, target_crs),
        y: spatial_dimension(y, dy, target_crs),
        t: temporal_dimension(t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_dimension_extent() {
        let dim = spatial_dimension(&[10.0, 20.0, 30.0], 10.0, "EPSG:4326");
        assert_eq!(dim.extent, (10.0, 30.0));
        assert_eq!(dim.step, 10.0);
    }

    #[test]
    fn test_temporal_dimension_step_with_multiple_groups() {
        let dim = temporal_dimension(&[0, 100, 200]);
        assert_eq!(dim.step, Some(100.0));
    }

    #[test]
    fn test_temporal_dimension_step_is_none_for_single_group() {
        let dim = temporal_dimension(&[42]);
        assert_eq!(dim.step, None);
    }
}
