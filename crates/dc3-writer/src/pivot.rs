//! Distribution ("pivot") archive packaging (§4.8, §12 supplemented
//! feature), built the way `original_source/datacube/core/pivot/format.py`
//! lays out its output: a `PRODUCT_<id>` directory holding a STAC-like
//! catalog JSON, a renamed preview, and the chunked store under
//! `IMAGE_<id>/IMG_DC3_<bands>_<res>m_<id>.ZARR`, tarred into a single
//! archive for upload.
//!
//! The source derives `<id>`'s random suffix from `random.choices`; this
//! workspace has no RNG crate in its dependency stack (§9's "no fabricated
//! dependencies" rule), so the suffix is instead a deterministic hash of the
//! cube id and build time, which satisfies the same uniqueness need without
//! adding a dependency the rest of the workspace doesn't otherwise use.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dc3_common::BuildRequest;
use dc3_metadata::attributes::CubeAttributes;
use serde_json::json;

use crate::error::WriterError;

pub struct PivotOutcome {
    /// The single `.TAR` archive to upload in place of the raw store.
    pub archive_path: PathBuf,
    /// The preview's entry name inside the archive, needed to build the
    /// `preview_url` the API response documents (§6).
    pub preview_entry_name: String,
}

fn unique_suffix(cube_id: &str, created_at: DateTime<Utc>) -> String {
    let mut hasher = DefaultHasher::new();
    cube_id.hash(&mut hasher);
    created_at.timestamp_nanos_opt().unwrap_or(0).hash(&mut hasher);
    format!("{:04x}", hasher.finish() & 0xffff)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), WriterError> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn write_gzip_tar(source_dir: &Path, archive_path: &Path, arcname: &str) -> Result<(), WriterError> {
    let file = std::fs::File::create(archive_path)?;
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder
        .append_dir_all(arcname, source_dir)
        .map_err(|e| WriterError::Packaging(e.to_string()))?;
    builder
        .into_inner()
        .map_err(|e| WriterError::Packaging(e.to_string()))?
        .finish()
        .map_err(|e| WriterError::Packaging(e.to_string()))?;
    Ok(())
}

fn build_catalog(request: &BuildRequest, id: &str, attributes: &CubeAttributes) -> serde_json::Value {
    let (xmin, xmax) = attributes.dimensions.x.extent;
    let (ymin, ymax) = attributes.dimensions.y.extent;
    let geometry = json!({
        "type": "Polygon",
        "coordinates": [[
            [xmin, ymin], [xmax, ymin], [xmax, ymax], [xmin, ymax], [xmin, ymin],
        ]],
    });

    json!({
        "id": id,
        "title": request.cube_id,
        "description": request.description,
        "bbox": [xmin, ymin, xmax, ymax],
        "geometry": geometry,
        "assets": {
            "datacube": attributes.variables.iter().map(|v| v.name.clone()).collect::<Vec<_>>(),
        },
        "properties": attributes.to_json_map(),
    })
}

/// Package a written chunked store (and optional preview file) into the
/// distribution archive named per §4.8, returning the single archive's path
/// and the preview's entry name inside it. `scratch_dir` is a caller-owned
/// working directory (the build's scratch arena); the intermediate
/// `PRODUCT_<id>` directory is removed once tarred, leaving only the
/// archive.
pub fn package_pivot_archive(
    request: &BuildRequest,
    store_root: &Path,
    preview_path: Option<&Path>,
    attributes: &CubeAttributes,
    scratch_dir: &Path,
) -> Result<PivotOutcome, WriterError> {
    let created_at = Utc::now();
    let compact_time = created_at.format("%Y%m%dT%H%M%S").to_string();
    let id = format!(
        "MMI_MULT_DCP_{compact_time}_{}",
        unique_suffix(&request.cube_id, created_at)
    );

    let product_dir_name = format!("PRODUCT_{id}");
    let pivot_root = scratch_dir.join(&product_dir_name);
    std::fs::create_dir_all(&pivot_root)?;

    let bands: String = request.bands.iter().map(|b| b.name.clone()).collect();
    let image_dir = pivot_root.join(format!("IMAGE_{id}"));
    std::fs::create_dir_all(&image_dir)?;
    let zarr_name = format!(
        "IMG_DC3_{bands}_{}m_{id}.ZARR",
        request.target_resolution_m as i64
    );
    copy_dir_recursive(store_root, &image_dir.join(&zarr_name))?;

    let preview_entry_name = format!("PREVIEW_{id}.PNG");
    if let Some(preview_path) = preview_path {
        std::fs::copy(preview_path, pivot_root.join(&preview_entry_name))?;
    }

    let catalog = build_catalog(request, &id, attributes);
    std::fs::write(
        pivot_root.join(format!("CAT_{id}.json")),
        serde_json::to_vec_pretty(&catalog)?,
    )?;

    let archive_path = scratch_dir.join(format!("{id}.TAR"));
    write_gzip_tar(&pivot_root, &archive_path, &product_dir_name)?;
    std::fs::remove_dir_all(&pivot_root)?;

    Ok(PivotOutcome {
        archive_path,
        preview_entry_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc3_common::{ChunkingStrategy, Crs};
    use dc3_metadata::dimensions::{CubeDimensions, SpatialDimension, TemporalDimension};
    use dc3_metadata::quality::{Indicators, QualityReport};

    fn toy_request() -> BuildRequest {
        BuildRequest {
            cube_id: "cube-1".into(),
            groups: vec![],
            bands: vec![dc3_common::BandDescriptor {
                name: "ndvi".into(),
                expression: "s2.b04".into(),
                clip: None,
                rgb_channel: None,
                colormap: None,
                description: None,
                unit: None,
            }],
            aliases: vec![],
            roi: "0,0,1,1".into(),
            roi_crs: Crs::wgs84(),
            target_resolution_m: 10.0,
            target_crs: Crs::wgs84(),
            chunking_strategy: ChunkingStrategy::Spinach,
            description: Some("toy".into()),
            package: true,
        }
    }

    fn toy_attributes() -> CubeAttributes {
        CubeAttributes {
            dimensions: CubeDimensions {
                x: SpatialDimension {
                    kind: "spatial",
                    extent: (0.0, 1.0),
                    step: 1.0,
                    reference_system: "EPSG:4326".into(),
                },
                y: SpatialDimension {
                    kind: "spatial",
                    extent: (0.0, 1.0),
                    step: 1.0,
                    reference_system: "EPSG:4326".into(),
                },
                t: TemporalDimension {
                    kind: "temporal",
                    extent: ("2024-01-01T00:00:00+00:00".into(), "2024-01-01T00:00:00+00:00".into()),
                    step: None,
                },
            },
            variables: vec![],
            preview: None,
            quality_indicators: QualityReport {
                cube: Indicators::one(),
                per_group: Default::default(),
                per_type: vec![],
                time_regularity: 1.0,
            },
            fill_ratio: 1.0,
            number_of_chunks: 1,
            chunk_weight_bytes: 4,
            composition: vec![],
        }
    }

    #[test]
    fn test_package_pivot_archive_produces_single_tar() {
        let scratch = tempfile::tempdir().unwrap();
        let store_dir = scratch.path().join("store");
        std::fs::create_dir_all(&store_dir).unwrap();
        std::fs::write(store_dir.join("x"), b"fake-zarr-array").unwrap();

        let preview = scratch.path().join("preview.png");
        std::fs::write(&preview, b"fake-png").unwrap();

        let outcome = package_pivot_archive(
            &toy_request(),
            &store_dir,
            Some(&preview),
            &toy_attributes(),
            scratch.path(),
        )
        .unwrap();

        assert!(outcome.archive_path.exists());
        assert!(outcome.archive_path.to_string_lossy().ends_with(".TAR"));
        assert!(outcome.preview_entry_name.starts_with("PREVIEW_"));
        // the intermediate PRODUCT_<id> directory must be cleaned up
        let leftovers: Vec<_> = std::fs::read_dir(scratch.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("PRODUCT_"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_unique_suffix_is_four_hex_chars() {
        let suffix = unique_suffix("cube-1", Utc::now());
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
