//! Center-granule election and master grid derivation (§4.5 step 2):
//! among every staged granule, the one whose bounding box centroid sits
//! closest to the ROI centroid donates its step size; the master grid then
//! covers the union of every granule's bounds at that step, seeded at the
//! ROI centroid so coordinates line up regardless of which granule is
//! chosen as center.

use std::collections::HashMap;
use std::path::Path;

use dc3_common::{BoundingBox, BuildError};
use dc3_projection::complete_grid;

use crate::map_reduce::StagedGranule;

fn open_bounds(store_path: &Path) -> Result<BoundingBox, BuildError> {
    let (x, y, _t, _vars) = dc3_staging::open_granule_store(store_path, &[])
        .map_err(|e| BuildError::mosaicking(format!("{}: {e}", store_path.display())))?;
    let (x0, x1) = (
        *x.first()
            .ok_or_else(|| BuildError::mosaicking("granule store has an empty x axis"))?,
        *x.last().expect("checked non-empty above"),
    );
    let (y0, y1) = (
        *y.first()
            .ok_or_else(|| BuildError::mosaicking("granule store has an empty y axis"))?,
        *y.last().expect("checked non-empty above"),
    );
    Ok(BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)))
}

fn mean_step(coords: &[f64], fallback: f64) -> f64 {
    if coords.len() < 2 {
        return fallback;
    }
    let sum: f64 = coords.windows(2).map(|w| w[1] - w[0]).sum();
    sum / (coords.len() - 1) as f64
}

pub struct MasterGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Derive the master grid from every staged granule across every group.
pub fn derive_master_grid(
    by_group: &HashMap<i64, Vec<StagedGranule>>,
    roi_centroid: (f64, f64),
    target_resolution_m: f64,
) -> Result<MasterGrid, BuildError> {
    // Deterministic order: sorted group timestamps, then uri-sorted granules
    // within each group (map_reduce::stage_all already sorts by uri), so
    // center-granule tie-breaking below is reproducible across runs despite
    // `by_group` itself being a `HashMap`.
    let mut group_timestamps: Vec<&i64> = by_group.keys().collect();
    group_timestamps.sort();

    let mut bounds_by_uri: Vec<(&StagedGranule, BoundingBox)> = Vec::new();
    for ts in group_timestamps {
        for granule in &by_group[ts] {
            let bounds = open_bounds(&granule.store_path)?;
            bounds_by_uri.push((granule, bounds));
        }
    }

    if bounds_by_uri.is_empty() {
        return Err(BuildError::mosaicking(
            "no granules were staged; cannot derive a master grid",
        ));
    }

    let (cx, cy) = roi_centroid;

    let (center_granule, center_bounds) = bounds_by_uri
        .iter()
        .map(|(g, b)| (g, b, b.centroid_distance(cx, cy)))
        .fold(None, |best: Option<(&&StagedGranule, &BoundingBox, f64)>, cur| {
            match best {
                None => Some(cur),
                Some(b) if cur.2 < b.2 => Some(cur),
                Some(b) => Some(b),
            }
        })
        .map(|(g, b, _)| (*g, *b))
        .expect("non-empty bounds_by_uri");

    let (center_x, center_y, _t, _vars) =
        dc3_staging::open_granule_store(&center_granule.store_path, &[])
            .map_err(|e| BuildError::mosaicking(e.to_string()))?;

    let dx = mean_step(&center_x, target_resolution_m).abs();
    let dy = mean_step(&center_y, target_resolution_m).abs();
    let dx = if dx > 0.0 { dx } else { target_resolution_m };
    let dy = if dy > 0.0 { dy } else { target_resolution_m };

    let union_bounds = bounds_by_uri
        .iter()
        .map(|(_, b)| *b)
        .reduce(|a, b| a.union(&b))
        .unwrap_or(center_bounds);

    let master_x = complete_grid(&[cx], dx, union_bounds.min_x, union_bounds.max_x);
    let master_y = complete_grid(&[cy], dy, union_bounds.min_y, union_bounds.max_y);

    Ok(MasterGrid {
        x: master_x,
        y: master_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_step_uses_average_diff() {
        assert_eq!(mean_step(&[0.0, 10.0, 20.0, 35.0], 1.0), 35.0 / 3.0);
    }

    #[test]
    fn test_mean_step_falls_back_on_single_point() {
        assert_eq!(mean_step(&[5.0], 2.0), 2.0);
    }
}
