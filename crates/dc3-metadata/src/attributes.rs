//! Assembles every C7 output into the attribute set the Cube Writer (C8)
//! attaches to the output store, keyed by the documented aliases (§4.8:
//! `cube:dimensions`, `dc3:preview`, `dc3:quality_indicators`,
//! `dc3:fill_ratio`, `dc3:composition`).

use serde::{Deserialize, Serialize};

use crate::chunks::ChunkReport;
use crate::dimensions::CubeDimensions;
use crate::preview::PreviewChannels;
use crate::quality::QualityReport;
use crate::variables::VariableDescriptor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionEntry {
    pub group_timestamp: i64,
    pub uri: String,
    pub product_type_source: String,
    pub product_type_format: String,
}

pub fn composition(request: &dc3_common::BuildRequest) -> Vec<CompositionEntry> {
    request
        .groups
        .iter()
        .flat_map(|group| {
            group.files.iter().map(move |file| CompositionEntry {
                group_timestamp: group.timestamp,
                uri: file.uri.clone(),
                product_type_source: file.product_type.source.clone(),
                product_type_format: file.product_type.format.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CubeAttributes {
    pub dimensions: CubeDimensions,
    pub variables: Vec<VariableDescriptor>,
    pub preview: Option<PreviewChannels>,
    pub quality_indicators: QualityReport,
    pub fill_ratio: f64,
    pub number_of_chunks: usize,
    pub chunk_weight_bytes: usize,
    pub composition: Vec<CompositionEntry>,
}

impl CubeAttributes {
    /// Flatten into the exact string keys the output store's attribute
    /// block uses. Every field here is plain owned data (no custom
    /// `Serialize` impl can fail on it), so `to_value` is infallible in
    /// practice.
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert(
            "cube:dimensions".to_string(),
            serde_json::to_value(&self.dimensions).expect("plain struct always serializes"),
        );
        map.insert(
            "cube:variables".to_string(),
            serde_json::to_value(&self.variables).expect("plain struct always serializes"),
        );
        if let Some(preview) = &self.preview {
            map.insert(
                "dc3:preview".to_string(),
                serde_json::to_value(preview).expect("plain struct always serializes"),
            );
        }
        map.insert(
            "dc3:quality_indicators".to_string(),
            serde_json::to_value(&self.quality_indicators).expect("plain struct always serializes"),
        );
        map.insert("dc3:fill_ratio".to_string(), serde_json::json!(self.fill_ratio));
        map.insert(
            "dc3:number_of_chunks".to_string(),
            serde_json::json!(self.number_of_chunks),
        );
        map.insert(
            "dc3:chunk_weight".to_string(),
            serde_json::json!(self.chunk_weight_bytes),
        );
        map.insert(
            "dc3:composition".to_string(),
            serde_json::to_value(&self.composition).expect("plain struct always serializes"),
        );
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::{SpatialDimension, TemporalDimension};
    use crate::quality::Indicators;

    fn toy_attributes() -> CubeAttributes {
        CubeAttributes {
            dimensions: CubeDimensions {
                x: SpatialDimension {
                    kind: "spatial",
                    extent: (0.0, 10.0),
                    step: 1.0,
                    reference_system: "EPSG:4326".into(),
                },
                y: SpatialDimension {
                    kind: "spatial",
                    extent: (0.0, 10.0),
                    step: 1.0,
                    reference_system: "EPSG:4326".into(),
                },
                t: TemporalDimension {
                    kind: "temporal",
                    extent: ("2024-01-01T00:00:00+00:00".into(), "2024-01-02T00:00:00+00:00".into()),
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
            fill_ratio: 0.9,
            number_of_chunks: 4,
            chunk_weight_bytes: 1024,
            composition: vec![],
        }
    }

    #[test]
    fn test_to_json_map_uses_documented_key_aliases() {
        let map = toy_attributes().to_json_map();
        assert!(map.contains_key("cube:dimensions"));
        assert!(map.contains_key("dc3:quality_indicators"));
        assert!(map.contains_key("dc3:fill_ratio"));
        assert!(map.contains_key("dc3:composition"));
        assert!(!map.contains_key("dc3:preview"));
    }
}
