//! Metadata & Quality (C7): dimension/variable descriptors, preview-channel
//! election, quality indicators, and chunk accounting, assembled into the
//! attribute set the Cube Writer (C8) attaches to the output store.
//!
//! Grounded on `crates/grid-processor/src/types.rs`'s `GridMetadata` shape
//! for the descriptor layout and on `crates/grid-processor/src/cache/
//! chunk_cache.rs` for the default `CacheHandle` implementation
//! ([`cache::LruCacheHandle`]).

pub mod attributes;
pub mod cache;
pub mod chunks;
pub mod dimensions;
pub mod error;
pub mod preview;
pub mod quality;
pub mod variables;

use dc3_chunking::CubeDims;
use dc3_common::{BuildRequest, CacheHandle, ChunkingStrategy, CubeDataset};
use dc3_projection::{parse_roi, polygon_bounds, transform_polygon};
use tracing::instrument;

use crate::attributes::{composition, CubeAttributes};
use crate::chunks::chunk_report;
use crate::dimensions::cube_dimensions;
use crate::error::MetadataError;
use crate::preview::elect_preview;
use crate::quality::compute_quality;
use crate::variables::variable_descriptors;

pub use quality::Indicators;

/// Everything C7 needs: the materialized, derived cube, the request that
/// produced it, the cache of staged-granule bounds, and the master grid
/// step sizes C5 derived.
pub struct MetadataInputs<'a> {
    pub request: &'a BuildRequest,
    pub cube: &'a CubeDataset,
    pub cache: &'a dyn CacheHandle,
    pub dx: f64,
    pub dy: f64,
}

/// Build the full attribute set for a finished cube.
#[instrument(skip(inputs), fields(cube_id = %inputs.request.cube_id))]
pub fn build_cube_attributes(inputs: MetadataInputs) -> Result<CubeAttributes, MetadataError> {
    let MetadataInputs {
        request,
        cube,
        cache,
        dx,
        dy,
    } = inputs;

    let dimensions = cube_dimensions(&cube.x, &cube.y, &cube.t, dx, dy, request.target_crs.as_str());
    let variables = variable_descriptors(cube, &request.bands);
    let preview = elect_preview(request);

    let roi_polygon = parse_roi(&request.roi).map_err(|e| MetadataError::BadRoi(e.to_string()))?;
    let roi_target = if request.roi_crs == request.target_crs {
        polygon_bounds(&roi_polygon)
    } else {
        let reprojected = transform_polygon(&request.roi_crs, &request.target_crs, &roi_polygon).map_err(|e| {
            MetadataError::ReprojectionFailed {
                uri: "<roi>".to_string(),
                detail: e.to_string(),
            }
        })?;
        polygon_bounds(&reprojected)
    };

    let quality_indicators = compute_quality(request, cache, &roi_target, &request.target_crs)?;

    let band_names: Vec<String> = request.bands.iter().map(|b| b.name.clone()).collect();
    let fill_ratio = quality::fill_ratio(cube, &band_names);

    let (nx, ny, nt) = cube.dims();
    let chunk = chunk_report(
        request.chunking_strategy,
        CubeDims {
            x: nx,
            y: ny,
            t: nt,
        },
    )
    .map_err(|e| MetadataError::BadChunkPlan(e.to_string()))?;

    Ok(CubeAttributes {
        dimensions,
        variables,
        preview,
        quality_indicators,
        fill_ratio,
        number_of_chunks: chunk.number_of_chunks,
        chunk_weight_bytes: chunk.chunk_weight_bytes,
        composition: composition(request),
    })
}

/// Re-export for callers that only want the strategy type name nearby;
/// avoids every downstream crate importing `dc3_common::ChunkingStrategy`
/// just to pass one through.
pub type Strategy = ChunkingStrategy;
