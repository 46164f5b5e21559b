//! The Raster Stager (C3) contract: `stage(storage, uri, subbands_required,
//! target_resolution, timestamp, scratch_dir, roi_polygon, target_crs) ->
//! granule_store_path`, per SPEC_FULL.md §4.3.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use dc3_algebra::Grid2D;
use dc3_common::model::{CachedRasterRecord, RasterFile};
use dc3_common::{BoundingBox, BuildError, Crs, InputStorage};
use dc3_projection::transform_polygon;
use geo::Polygon;
use tracing::{debug, instrument};

use crate::decoder::{decode_raw_band, RasterFormatRegistry};
use crate::error::StagingError;
use crate::manifest::{resolve_variant, GranuleManifest};
use crate::resample::{crop_to_bbox, reproject_nearest_neighbor, resample_to_grid};
use crate::store::write_granule_store;

/// Everything `stage` needs, gathered into one struct since the contract has
/// eight logical inputs beyond the storage/registry collaborators.
pub struct StageRequest<'a> {
    pub storage: &'a dyn InputStorage,
    pub registry: &'a RasterFormatRegistry,
    pub raster: &'a RasterFile,
    /// cube band name -> product subband name, e.g. `{"red": "B04"}`.
    pub subbands_required: &'a HashMap<String, String>,
    pub target_resolution_m: f64,
    /// The group's bucket timestamp (distinct from the manifest's own
    /// acquisition timestamp, which seeds the cached record instead).
    pub timestamp: i64,
    pub scratch_dir: &'a Path,
    pub roi_polygon: &'a Polygon<f64>,
    pub roi_crs: &'a Crs,
    pub target_crs: &'a Crs,
}

pub struct StageOutcome {
    pub granule_store_path: PathBuf,
    pub cached_record: CachedRasterRecord,
}

#[instrument(skip(req), fields(uri = %req.raster.uri))]
pub fn stage(req: StageRequest) -> Result<StageOutcome, BuildError> {
    stage_inner(&req).map_err(|e| e.into_build_error(&req.raster.uri))
}

fn stage_inner(req: &StageRequest) -> Result<StageOutcome, StagingError> {
    let mut reader = req
        .storage
        .open(&req.raster.uri)
        .map_err(|e| StagingError::Other(anyhow::anyhow!(e)))?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(StagingError::Open)?;

    let decoder = req.registry.resolve(&req.raster.product_type);
    let mut archive = crate::archive::open_archive(bytes)?;

    let manifest_bytes = archive.read_entry(decoder.manifest_entry())?;
    let manifest_xml = String::from_utf8_lossy(&manifest_bytes).into_owned();
    let manifest = GranuleManifest::parse(&manifest_xml)?;

    let acquisition_timestamp = manifest
        .acquisition_timestamp()
        .ok_or(StagingError::MissingTimestamp)?;
    let source_crs = Crs::parse(&manifest.source_crs)?;
    let source_bounds = BoundingBox::new(manifest.left, manifest.bottom, manifest.right, manifest.top);

    let roi_in_source_crs = transform_polygon(req.roi_crs, &source_crs, req.roi_polygon)?;
    let roi_bounds_in_source_crs = dc3_projection::polygon_bounds(&roi_in_source_crs);
    let intersection = source_bounds
        .intersection(&roi_bounds_in_source_crs)
        .ok_or(StagingError::EmptyIntersection)?;

    debug!(
        left = intersection.min_x,
        bottom = intersection.min_y,
        right = intersection.max_x,
        top = intersection.max_y,
        "staging subbands within ROI/granule intersection"
    );

    let mut staged: HashMap<String, (Vec<f64>, Vec<f64>, Grid2D)> = HashMap::new();

    for (cube_band_name, product_subband_name) in req.subbands_required {
        let entry = manifest
            .subband(product_subband_name)
            .ok_or_else(|| StagingError::SubbandMissing(product_subband_name.clone()))?;
        let variant = resolve_variant(entry, req.target_resolution_m)
            .ok_or_else(|| StagingError::NoResolutionVariant(product_subband_name.clone()))?;

        let raw = archive.read_entry(&variant.entry)?;
        let grid = decode_raw_band(&raw, variant.width, variant.height)?;

        let step_x = (manifest.right - manifest.left) / variant.width as f64;
        let step_y = (manifest.top - manifest.bottom) / variant.height as f64;
        let band_x: Vec<f64> = (0..variant.width)
            .map(|i| manifest.left + (i as f64 + 0.5) * step_x)
            .collect();
        let band_y: Vec<f64> = (0..variant.height)
            .map(|i| manifest.bottom + (i as f64 + 0.5) * step_y)
            .collect();

        let (cropped_x, cropped_y, cropped_grid) =
            crop_to_bbox(&band_x, &band_y, &grid, &intersection)
                .ok_or(StagingError::EmptyIntersection)?;

        let (tx, ty, tgrid, _target_bbox) = reproject_nearest_neighbor(
            &cropped_x,
            &cropped_y,
            &cropped_grid,
            &source_crs,
            req.target_crs,
            req.target_resolution_m,
        )?;

        staged.insert(cube_band_name.clone(), (tx, ty, tgrid));
    }

    let (final_x, final_y) = finest_grid(&staged);

    let mut variables = HashMap::new();
    for (name, (own_x, own_y, grid)) in &staged {
        let resampled = if own_x == &final_x && own_y == &final_y {
            grid.clone()
        } else {
            resample_to_grid(own_x, own_y, grid, &final_x, &final_y)
        };
        variables.insert(name.clone(), resampled);
    }

    if decoder.masks_negative_as_nodata() {
        for grid in variables.values_mut() {
            mask_negative_as_nodata(grid);
        }
    }

    let final_path = req.scratch_dir.join("final");
    write_granule_store(&final_path, &final_x, &final_y, req.timestamp, &variables)?;

    let cached_record = CachedRasterRecord {
        product_timestamp: acquisition_timestamp,
        source_crs: manifest.source_crs.clone(),
        left: source_bounds.min_x,
        bottom: source_bounds.min_y,
        right: source_bounds.max_x,
        top: source_bounds.max_y,
        product_type: req.raster.product_type.clone(),
    };

    Ok(StageOutcome {
        granule_store_path: final_path,
        cached_record,
    })
}

/// Among the staged per-band grids, the finest grid is the one with the most
/// points along each axis (§4.3 step 7: "select the finest x-axis and
/// y-axis among them"). The reference x and y may come from different bands.
fn finest_grid(staged: &HashMap<String, (Vec<f64>, Vec<f64>, Grid2D)>) -> (Vec<f64>, Vec<f64>) {
    let x = staged
        .values()
        .max_by_key(|(x, _, _)| x.len())
        .map(|(x, _, _)| x.clone())
        .unwrap_or_default();
    let y = staged
        .values()
        .max_by_key(|(_, y, _)| y.len())
        .map(|(_, y, _)| y.clone())
        .unwrap_or_default();
    (x, y)
}

fn mask_negative_as_nodata(grid: &mut Grid2D) {
    let width = grid.width();
    let height = grid.height();
    for row in 0..height {
        for col in 0..width {
            let v = grid.get(row, col);
            if !v.is_nan() && v < 0.0 {
                grid.set(row, col, f64::NAN);
            }
        }
    }
}
