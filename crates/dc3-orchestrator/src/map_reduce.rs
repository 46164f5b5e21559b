//! The map half of C5: a bounded worker-pool fan-out over every raster file
//! in the request, each invoking the Raster Stager (C3). Grounded on the
//! redesign note in SPEC_FULL.md §9 (an OS-thread pool, not an async task
//! set, since staging is disk/CPU bound); `rayon` gives the bounded pool
//! without hand-rolling the `std::thread`/`mpsc` plumbing the note describes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dc3_common::model::RasterFile;
use dc3_common::{BuildError, BuildRequest, CacheHandle, InputStorage};
use dc3_staging::{stage, RasterFormatRegistry, StageRequest};
use geo::Polygon;
use rayon::prelude::*;

use crate::plan::{alias_for_product_type, RequestPlan};

/// One successfully staged granule, carrying exactly what the stack phase
/// needs: where its store lives, which variables it wrote, and the
/// acquisition timestamp used to break SAME-extent ties in C4's mosaic.
#[derive(Debug, Clone)]
pub struct StagedGranule {
    pub uri: String,
    pub store_path: PathBuf,
    pub variable_names: Vec<String>,
    pub acquisition_timestamp: i64,
}

struct WorkItem<'a> {
    group_timestamp: i64,
    raster: &'a RasterFile,
    variable_names: Vec<String>,
    subbands_required: HashMap<String, String>,
    scratch_dir: PathBuf,
}

/// Stage every file across every group, bounded to `worker_threads`
/// concurrent workers. Returns granules grouped by their request-level group
/// timestamp (distinct from each granule's own acquisition timestamp).
#[allow(clippy::too_many_arguments)]
pub fn stage_all(
    storage: &dyn InputStorage,
    registry: &RasterFormatRegistry,
    request: &BuildRequest,
    plan: &RequestPlan,
    roi_polygon: &Polygon<f64>,
    roi_crs: &dc3_common::Crs,
    scratch_root: &Path,
    worker_threads: usize,
    cache: &dyn CacheHandle,
) -> Result<HashMap<i64, Vec<StagedGranule>>, BuildError> {
    let mut items = Vec::new();
    for group in &request.groups {
        for file in &group.files {
            let alias =
                alias_for_product_type(request, &file.uri, &file.product_type).map_err(BuildError::from)?;
            let subbands_required = plan
                .per_alias_subbands
                .get(alias)
                .cloned()
                .unwrap_or_default();
            let variable_names: Vec<String> = subbands_required.keys().cloned().collect();
            items.push(WorkItem {
                group_timestamp: group.timestamp,
                raster: file,
                variable_names,
                subbands_required,
                scratch_dir: scratch_root.join(&file.id),
            });
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_threads.max(1))
        .build()
        .map_err(|e| BuildError::internal(format!("failed to build staging worker pool: {e}")))?;

    let results: Vec<Result<(i64, StagedGranule), BuildError>> = pool.install(|| {
        items
            .par_iter()
            .map(|item| {
                let outcome = stage(StageRequest {
                    storage,
                    registry,
                    raster: item.raster,
                    subbands_required: &item.subbands_required,
                    target_resolution_m: request.target_resolution_m,
                    timestamp: item.group_timestamp,
                    scratch_dir: &item.scratch_dir,
                    roi_polygon,
                    roi_crs,
                    target_crs: &request.target_crs,
                })?;

                cache.put(&item.raster.uri, outcome.cached_record.clone());

                Ok((
                    item.group_timestamp,
                    StagedGranule {
                        uri: item.raster.uri.clone(),
                        store_path: outcome.granule_store_path,
                        variable_names: item.variable_names.clone(),
                        acquisition_timestamp: outcome.cached_record.product_timestamp,
                    },
                ))
            })
            .collect()
    });

    let mut by_group: HashMap<i64, Vec<StagedGranule>> = HashMap::new();
    for result in results {
        let (group_timestamp, granule) = result?;
        by_group.entry(group_timestamp).or_default().push(granule);
    }

    for granules in by_group.values_mut() {
        granules.sort_by(|a, b| a.uri.cmp(&b.uri));
    }

    Ok(by_group)
}
