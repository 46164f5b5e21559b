//! Build Controller (C9): wires every other component into the single
//! request-to-result pipeline (§4.9) — validate, assemble (C1/C3-C5), derive
//! (C6), describe (C7), write and (optionally) package (C8), upload, and
//! unconditionally reclaim the scratch arena.
//!
//! Grounded on `original_source/datacube/core/build_cube.py`'s `build_cube`
//! function for the stage ordering and on
//! `crates/ingestion/src/ingester.rs`'s explicit-dependency-injection
//! constructor shape for how the collaborators are threaded through.

use std::path::Path;

use dc3_common::{BuildContext, BuildError, BuildResult, CubeDataset, InputStorage};
use dc3_metadata::MetadataInputs;
use dc3_object_store::OutputStore;
use dc3_orchestrator::{assemble_cube, AssembleRequest};
use dc3_projection::parse_roi;
use dc3_staging::RasterFormatRegistry;
use dc3_writer::{package_pivot_archive, write_cube_store};
use tracing::{instrument, warn};

use crate::derive::derive_bands;
use crate::preview::{prepare_preview, PreviewArtifact, PreviewRenderer};
use crate::result::CubeBuildResult;
use crate::validate::validate_request;

/// Every collaborator a single build needs, gathered for the same reason
/// [`AssembleRequest`] is: too many logical inputs for positional arguments.
pub struct BuildInputs<'a> {
    pub request: &'a dc3_common::BuildRequest,
    pub ctx: &'a BuildContext,
    pub storage: &'a dyn InputStorage,
    pub registry: &'a RasterFormatRegistry,
    pub output: &'a OutputStore,
    pub renderer: &'a dyn PreviewRenderer,
}

/// Run a single cube build end to end. The scratch arena
/// (`ctx.scratch_arena(cube_id)`) is created at the start and removed
/// unconditionally at the end, success or failure, since `BuildContext`
/// exclusively owns it and Rust has no try/finally to express that
/// symmetrically around the `?`-propagating pipeline below.
#[instrument(skip(inputs), fields(cube_id = %inputs.request.cube_id))]
pub async fn run_build(inputs: BuildInputs<'_>) -> BuildResult<CubeBuildResult> {
    validate_request(inputs.request)?;

    let scratch_root = inputs.ctx.scratch_arena(&inputs.request.cube_id);
    std::fs::create_dir_all(&scratch_root)?;

    let outcome = run_pipeline(&inputs, &scratch_root).await;

    if let Err(err) = std::fs::remove_dir_all(&scratch_root) {
        warn!(cube_id = %inputs.request.cube_id, error = %err, "scratch arena cleanup failed");
    }

    outcome
}

async fn run_pipeline(inputs: &BuildInputs<'_>, scratch_root: &Path) -> BuildResult<CubeBuildResult> {
    let request = inputs.request;

    let roi_polygon = parse_roi(&request.roi).map_err(|e| BuildError::bad_request(format!("malformed ROI: {e}")))?;

    let mut cube = assemble_cube(AssembleRequest {
        storage: inputs.storage,
        registry: inputs.registry,
        request,
        roi_polygon: &roi_polygon,
        scratch_root,
        cache: inputs.ctx.cache.as_ref(),
    })?;

    derive_bands(&mut cube, &request.bands)?;
    let band_names: Vec<String> = request.bands.iter().map(|b| b.name.clone()).collect();
    cube.retain_variables(&band_names);

    let dx = step_of(&cube.x, request.target_resolution_m);
    let dy = step_of(&cube.y, request.target_resolution_m);

    let attributes = build_cube_attributes_for(&cube, inputs, dx, dy)?;

    let store_dir = scratch_root.join("store");
    let write_outcome = write_cube_store(&store_dir, &cube, request.chunking_strategy, &attributes)
        .map_err(BuildError::from)?;

    let preview_artifact = render_preview(inputs, &cube, &attributes)?;
    let preview_path = stage_preview_file(scratch_root, preview_artifact.as_ref());

    if request.package {
        package_and_upload(inputs, &write_outcome.store_root, preview_path.as_deref(), &attributes, scratch_root, preview_artifact).await
    } else {
        upload_direct(inputs, &write_outcome.store_root, preview_path.as_deref(), preview_artifact).await
    }
}

fn build_cube_attributes_for(
    cube: &CubeDataset,
    inputs: &BuildInputs<'_>,
    dx: f64,
    dy: f64,
) -> BuildResult<dc3_metadata::attributes::CubeAttributes> {
    dc3_metadata::build_cube_attributes(MetadataInputs {
        request: inputs.request,
        cube,
        cache: inputs.ctx.cache.as_ref(),
        dx,
        dy,
    })
    .map_err(BuildError::from)
}

fn render_preview(
    inputs: &BuildInputs<'_>,
    cube: &CubeDataset,
    attributes: &dc3_metadata::attributes::CubeAttributes,
) -> BuildResult<Option<PreviewArtifact>> {
    match &attributes.preview {
        Some(channels) => {
            let preview_request = prepare_preview(cube, channels);
            Ok(Some(inputs.renderer.render(&preview_request)?))
        }
        None => Ok(None),
    }
}

/// Materialize the rendered preview to a scratch file, when the renderer
/// actually produced bytes (the null renderer yields none, so the pipeline
/// still completes without a preview file).
fn stage_preview_file(scratch_root: &Path, artifact: Option<&PreviewArtifact>) -> Option<std::path::PathBuf> {
    let artifact = artifact?;
    if artifact.bytes.is_empty() {
        return None;
    }
    let path = scratch_root.join(format!("preview.{}", artifact.extension));
    std::fs::write(&path, &artifact.bytes).ok()?;
    Some(path)
}

async fn package_and_upload(
    inputs: &BuildInputs<'_>,
    store_root: &Path,
    preview_path: Option<&Path>,
    attributes: &dc3_metadata::attributes::CubeAttributes,
    scratch_root: &Path,
    preview_artifact: Option<PreviewArtifact>,
) -> BuildResult<CubeBuildResult> {
    let request = inputs.request;
    let pivot = package_pivot_archive(request, store_root, preview_path, attributes, scratch_root)
        .map_err(BuildError::from)?;

    let archive_name = pivot
        .archive_path
        .file_name()
        .ok_or_else(|| BuildError::internal("packaged archive has no file name"))?
        .to_string_lossy()
        .into_owned();
    let datacube_url = format!("{}/{archive_name}", request.cube_id);

    inputs
        .output
        .upload_file(&pivot.archive_path, &datacube_url)
        .await
        .map_err(BuildError::from)?;

    // The archive's preview entry lives inside the uploaded `.TAR`, not as a
    // separate object; the URL documents where to find it once unpacked.
    let preview_url = Some(format!("{datacube_url}/{}", pivot.preview_entry_name));

    Ok(CubeBuildResult {
        datacube_url,
        preview_url,
        preview: preview_artifact.map(|a| a.base64),
    })
}

async fn upload_direct(
    inputs: &BuildInputs<'_>,
    store_root: &Path,
    preview_path: Option<&Path>,
    preview_artifact: Option<PreviewArtifact>,
) -> BuildResult<CubeBuildResult> {
    let destination_prefix = inputs.request.cube_id.clone();
    inputs
        .output
        .upload_directory(store_root, &destination_prefix)
        .await
        .map_err(BuildError::from)?;

    let preview_url = match (preview_path, &preview_artifact) {
        (Some(path), Some(artifact)) => {
            let destination = format!("{destination_prefix}.{}", artifact.extension);
            inputs
                .output
                .upload_file(path, &destination)
                .await
                .map_err(BuildError::from)?;
            Some(destination)
        }
        _ => None,
    };

    Ok(CubeBuildResult {
        datacube_url: destination_prefix,
        preview_url,
        preview: preview_artifact.map(|a| a.base64),
    })
}

/// Grid step size from the first coordinate gap, falling back to the
/// request's target resolution for a degenerate single-point axis. Mirrors
/// `dc3_orchestrator`'s private `step_of` helper, recomputed here since
/// `assemble_cube` returns only the finished [`CubeDataset`], not the master
/// grid's step sizes.
fn step_of(coords: &[f64], fallback: f64) -> f64 {
    if coords.len() < 2 {
        return fallback;
    }
    (coords[1] - coords[0]).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_of_uses_first_gap() {
        assert_eq!(step_of(&[0.0, 5.0, 10.0], 1.0), 5.0);
    }

    #[test]
    fn test_step_of_falls_back_on_single_point() {
        assert_eq!(step_of(&[2.0], 7.5), 7.5);
    }
}
