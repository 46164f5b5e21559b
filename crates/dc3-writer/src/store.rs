//! Persists the finished, enriched cube to a local chunked-store directory
//! (§6's output store layout: one subdirectory per variable/coordinate,
//! compressed chunk files, a consolidated metadata file at root).
//!
//! Grounded on `dc3-staging::store::write_granule_store`'s `zarrs` usage,
//! generalized from the per-granule SPINACH-only layout to the request's
//! declared [`ChunkingStrategy`] (C2) and an arbitrary named variable set
//! over the full `(t, y, x)` cube rather than a single timestamp slice.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dc3_chunking::{plan_chunk_shape, CubeDims};
use dc3_common::{ChunkingStrategy, CubeDataset};
use dc3_metadata::attributes::CubeAttributes;
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs_filesystem::FilesystemStore;

use crate::error::WriterError;

pub struct WriteOutcome {
    pub store_root: PathBuf,
}

fn write_1d_array(store: &Arc<FilesystemStore>, path: &str, values: &[f64]) -> Result<(), WriterError> {
    let data: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    let len = data.len().max(1) as u64;

    let array = ArrayBuilder::new(
        vec![len],
        DataType::Float32,
        vec![len].try_into().unwrap(),
        FillValue::from(f32::NAN),
    )
    .build(store.clone(), path)
    .map_err(|e| WriterError::StoreWrite(e.to_string()))?;

    array
        .store_metadata()
        .map_err(|e| WriterError::StoreWrite(e.to_string()))?;

    let subset = zarrs::array_subset::ArraySubset::new_with_start_shape(vec![0], vec![data.len() as u64])
        .map_err(|e| WriterError::StoreWrite(e.to_string()))?;
    array
        .store_array_subset_elements(&subset, &data)
        .map_err(|e| WriterError::StoreWrite(e.to_string()))?;
    Ok(())
}

/// Write the finished cube to `root`: coordinate arrays `x`, `y`, `t`, one
/// `(t, y, x)` array per variable chunked per `strategy` (§4.8 "Chunk via C2
/// and write to the output store"), and `consolidated_metadata.json`
/// carrying every [`CubeAttributes`] key under its documented alias (§4.7).
pub fn write_cube_store(
    root: &Path,
    cube: &CubeDataset,
    strategy: ChunkingStrategy,
    attributes: &CubeAttributes,
) -> Result<WriteOutcome, WriterError> {
    std::fs::create_dir_all(root)?;
    let store = Arc::new(FilesystemStore::new(root).map_err(|e| WriterError::StoreWrite(e.to_string()))?);

    write_1d_array(&store, "/x", &cube.x)?;
    write_1d_array(&store, "/y", &cube.y)?;
    let t_as_f64: Vec<f64> = cube.t.iter().map(|&t| t as f64).collect();
    write_1d_array(&store, "/t", &t_as_f64)?;

    let (nx, ny, nt) = cube.dims();
    let shape = plan_chunk_shape(
        strategy,
        CubeDims {
            x: nx,
            y: ny,
            t: nt,
        },
    )?;

    let mut names: Vec<&String> = cube.variables.keys().collect();
    names.sort();

    for name in names {
        let array3 = &cube.variables[name];
        let path = format!("/{name}");
        let data: Vec<f32> = array3.as_slice().iter().map(|&v| v as f32).collect();

        let chunk_grid: zarrs::array::ChunkGrid = vec![shape.t as u64, shape.y as u64, shape.x as u64]
            .try_into()
            .map_err(|e| WriterError::StoreWrite(format!("{e:?}")))?;

        let array: Array<FilesystemStore> = ArrayBuilder::new(
            vec![nt as u64, ny as u64, nx as u64],
            DataType::Float32,
            chunk_grid,
            FillValue::from(f32::NAN),
        )
        .build(store.clone(), &path)
        .map_err(|e| WriterError::StoreWrite(e.to_string()))?;

        array
            .store_metadata()
            .map_err(|e| WriterError::StoreWrite(e.to_string()))?;

        let subset = zarrs::array_subset::ArraySubset::new_with_start_shape(
            vec![0, 0, 0],
            vec![nt as u64, ny as u64, nx as u64],
        )
        .map_err(|e| WriterError::StoreWrite(e.to_string()))?;
        array
            .store_array_subset_elements(&subset, &data)
            .map_err(|e| WriterError::StoreWrite(e.to_string()))?;
    }

    let json = serde_json::Value::Object(attributes.to_json_map());
    std::fs::write(root.join("consolidated_metadata.json"), serde_json::to_vec_pretty(&json)?)?;

    Ok(WriteOutcome {
        store_root: root.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc3_common::Array3;
    use dc3_metadata::attributes::CubeAttributes;
    use dc3_metadata::dimensions::{SpatialDimension, TemporalDimension};
    use dc3_metadata::quality::{Indicators, QualityReport};

    fn toy_attributes() -> CubeAttributes {
        CubeAttributes {
            dimensions: dc3_metadata::dimensions::CubeDimensions {
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
                cube: Indicators {
                    time_compacity: 1.0,
                    spatial_coverage: 1.0,
                    group_lightness: 1.0,
                },
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
    fn test_write_cube_store_round_trip_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut cube = CubeDataset::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![100]);
        cube.variables.insert("red".into(), Array3::filled(2, 2, 1, 0.5));

        let outcome = write_cube_store(dir.path(), &cube, ChunkingStrategy::Spinach, &toy_attributes()).unwrap();
        assert_eq!(outcome.store_root, dir.path());
        assert!(dir.path().join("x").exists());
        assert!(dir.path().join("y").exists());
        assert!(dir.path().join("t").exists());
        assert!(dir.path().join("red").exists());
        assert!(dir.path().join("consolidated_metadata.json").exists());
    }

    #[test]
    fn test_consolidated_metadata_uses_documented_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cube = CubeDataset::new(vec![0.0], vec![0.0], vec![1]);
        write_cube_store(dir.path(), &cube, ChunkingStrategy::Spinach, &toy_attributes()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("consolidated_metadata.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("dc3:quality_indicators").is_some());
        assert!(value.get("dc3:composition").is_some());
    }
}
