//! Per-timestamp mosaicking and temporal concatenation (§4.5 steps 3-4): for
//! each group, resample every granule onto a sub-grid of the master grid,
//! reduce them with C4's mosaic/merge algebra, then stack the per-timestamp
//! results into the final [`CubeDataset`].

use std::collections::HashMap;

use dc3_algebra::{merge_datasets, Dataset, Grid2D};
use dc3_common::{Array3, BuildError, CubeDataset};
use dc3_projection::complete_grid;
use dc3_staging::resample::resample_to_grid;
use rayon::prelude::*;

use crate::center::MasterGrid;
use crate::map_reduce::StagedGranule;

/// Restrict `master_axis` to the span `[lo, hi]`, then extend it back out to
/// exactly cover `[lo, hi]` at `step` (§4.5 step 3: "restrict the master grid
/// to the granule's bounds, extend to fill the granule's bounding box").
/// Falls back to seeding from `lo` when the restriction is empty (the
/// granule's bounds fall entirely between two master grid points).
fn restrict_and_extend(master_axis: &[f64], step: f64, lo: f64, hi: f64) -> Vec<f64> {
    let restricted: Vec<f64> = master_axis
        .iter()
        .copied()
        .filter(|&v| v >= lo && v <= hi)
        .collect();

    if restricted.is_empty() {
        complete_grid(&[lo], step, lo, hi)
    } else {
        complete_grid(&restricted, step, lo, hi)
    }
}

fn granule_to_dataset(
    granule: &StagedGranule,
    master: &MasterGrid,
    dx: f64,
    dy: f64,
) -> Result<Dataset, BuildError> {
    let (gx, gy, _gt, gvars) =
        dc3_staging::open_granule_store(&granule.store_path, &granule.variable_names)
            .map_err(|e| BuildError::mosaicking(format!("{}: {e}", granule.uri)))?;

    let (gx0, gx1) = (
        *gx.first()
            .ok_or_else(|| BuildError::mosaicking("granule has an empty x axis"))?,
        *gx.last().expect("checked non-empty above"),
    );
    let (gy0, gy1) = (
        *gy.first()
            .ok_or_else(|| BuildError::mosaicking("granule has an empty y axis"))?,
        *gy.last().expect("checked non-empty above"),
    );

    let sub_x = restrict_and_extend(&master.x, dx, gx0.min(gx1), gx0.max(gx1));
    let sub_y = restrict_and_extend(&master.y, dy, gy0.min(gy1), gy0.max(gy1));

    let mut variables: HashMap<String, Grid2D> = HashMap::new();
    for (name, grid) in &gvars {
        let resampled = resample_to_grid(&gx, &gy, grid, &sub_x, &sub_y);
        variables.insert(name.clone(), resampled);
    }

    Ok(Dataset {
        x: sub_x,
        y: sub_y,
        product_timestamp: granule.acquisition_timestamp,
        variables,
    })
}

/// Mosaic every granule in a single timestamp bucket, in uri-ascending
/// order, via C4's schema-aware `merge_datasets` reduction.
fn mosaic_group(
    granules: &[StagedGranule],
    master: &MasterGrid,
    dx: f64,
    dy: f64,
) -> Result<Dataset, BuildError> {
    let mut acc: Option<Dataset> = None;
    for granule in granules {
        let ds = granule_to_dataset(granule, master, dx, dy)?;
        acc = Some(match acc {
            None => ds,
            Some(a) => merge_datasets(&a, &ds),
        });
    }
    acc.ok_or_else(|| BuildError::mosaicking("group has no granules to mosaic"))
}

/// Place a (possibly partial-extent, partial-variable-set) timestamp dataset
/// onto the full master grid, NaN everywhere it doesn't cover.
fn place_on_master_grid(
    ds: &Dataset,
    master: &MasterGrid,
    all_variable_names: &[String],
) -> Dataset {
    let mut canvas_variables = HashMap::new();
    for name in all_variable_names {
        canvas_variables.insert(
            name.clone(),
            Grid2D::filled(master.x.len(), master.y.len(), f64::NAN),
        );
    }
    let canvas = Dataset {
        x: master.x.clone(),
        y: master.y.clone(),
        product_timestamp: ds.product_timestamp,
        variables: canvas_variables,
    };
    Dataset::combine_by_coords(ds, &canvas)
}

/// Stage-independent stacking entry point: given granules already bucketed
/// by group timestamp and the derived master grid, produce the final cube
/// (pre-derivation: variables are still raw `alias.subband` values, not the
/// request's declared band expressions).
pub fn stack_cube(
    by_group: HashMap<i64, Vec<StagedGranule>>,
    master: &MasterGrid,
    all_variable_names: &[String],
    dx: f64,
    dy: f64,
) -> Result<CubeDataset, BuildError> {
    let mut timestamps: Vec<i64> = by_group.keys().copied().collect();
    timestamps.sort();

    let (nx, ny, nt) = (master.x.len(), master.y.len(), timestamps.len());
    let mut cube = CubeDataset::new(master.x.clone(), master.y.clone(), timestamps.clone());
    for name in all_variable_names {
        cube.variables
            .insert(name.clone(), Array3::filled(nx, ny, nt, f64::NAN));
    }

    // Timestamps mosaic independently of one another (only the fold *within*
    // a timestamp is order-sensitive, per §5); run them across the same
    // bounded pool the staging map phase uses.
    let placed_per_timestamp: Vec<Result<Dataset, BuildError>> = timestamps
        .par_iter()
        .map(|ts| {
            let granules = &by_group[ts];
            let mosaicked = mosaic_group(granules, master, dx, dy)?;
            Ok(place_on_master_grid(&mosaicked, master, all_variable_names))
        })
        .collect();

    for (t_idx, placed) in placed_per_timestamp.into_iter().enumerate() {
        let placed = placed?;
        for name in all_variable_names {
            if let Some(grid) = placed.variables.get(name) {
                cube.variables
                    .get_mut(name)
                    .expect("variable pre-populated above")
                    .set_slice(t_idx, grid.as_slice());
            }
        }
    }

    Ok(cube)
}

/// The single-group, single-file fast path (§4.5 step 1): no master grid
/// derivation or mosaicking needed, the granule's own coordinates become the
/// cube's.
pub fn single_granule_cube(
    group_timestamp: i64,
    granule: &StagedGranule,
    all_variable_names: &[String],
) -> Result<CubeDataset, BuildError> {
    let (gx, gy, _gt, gvars) =
        dc3_staging::open_granule_store(&granule.store_path, &granule.variable_names)
            .map_err(|e| BuildError::mosaicking(format!("{}: {e}", granule.uri)))?;

    let (nx, ny) = (gx.len(), gy.len());
    let mut cube = CubeDataset::new(gx, gy, vec![group_timestamp]);
    for name in all_variable_names {
        let mut array = Array3::filled(nx, ny, 1, f64::NAN);
        if let Some(grid) = gvars.get(name) {
            array.set_slice(0, grid.as_slice());
        }
        cube.variables.insert(name.clone(), array);
    }
    Ok(cube)
}
