//! Request-level domain types shared by every component (C1-C9).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::crs::Crs;

/// x:y:t chunk template selector, per the Chunk Planner (C2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChunkingStrategy {
    Potato,
    Carrot,
    Spinach,
}

/// An RGB channel slot a band may be assigned to for preview generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RgbChannel {
    Red,
    Green,
    Blue,
}

/// (source, format) pair identifying how a raster file should be decoded.
/// Equality is structural: two product types are the same iff both fields
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductType {
    pub source: String,
    pub format: String,
}

impl ProductType {
    pub fn new(source: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            format: format.into(),
        }
    }
}

/// A product type bound to a short alias used by band expressions
/// (`alias.subband`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasedProductType {
    pub alias: String,
    pub product_type: ProductType,
}

/// One band a build request wants materialized in the final cube.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandDescriptor {
    pub name: String,
    /// Expression over `alias.subband` tokens, e.g. `"s2.b04 - s2.b08"`.
    pub expression: String,
    pub clip: Option<(f64, f64)>,
    pub rgb_channel: Option<RgbChannel>,
    pub colormap: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
}

/// A single source raster: a product type tag, its location, and an opaque id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterFile {
    pub id: String,
    pub uri: String,
    pub product_type: ProductType,
}

/// A temporal bucket: every file in the group shares the same acquisition
/// window and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterGroup {
    pub timestamp: i64,
    pub files: Vec<RasterFile>,
}

/// The immutable input to a single cube build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRequest {
    pub cube_id: String,
    pub groups: Vec<RasterGroup>,
    pub bands: Vec<BandDescriptor>,
    pub aliases: Vec<AliasedProductType>,
    /// BBOX ("xmin,ymin,xmax,ymax") or WKT POLYGON string.
    pub roi: String,
    pub roi_crs: Crs,
    pub target_resolution_m: f64,
    pub target_crs: Crs,
    pub chunking_strategy: ChunkingStrategy,
    pub description: Option<String>,
    /// When set, package the cube as a distribution archive (C8) instead of
    /// writing the chunked store directly to the destination root.
    pub package: bool,
}

impl BuildRequest {
    /// Map from alias -> ProductType, used to resolve `alias.subband` tokens
    /// and to validate invariant 1 (every file's product type is aliased).
    pub fn alias_index(&self) -> HashMap<&str, &ProductType> {
        self.aliases
            .iter()
            .map(|a| (a.alias.as_str(), &a.product_type))
            .collect()
    }

    pub fn rgb_bands(&self) -> Vec<&BandDescriptor> {
        self.bands
            .iter()
            .filter(|b| b.rgb_channel.is_some())
            .collect()
    }
}

/// Per staged raster metadata, written by C3 and consumed by C7.
/// Keyed by raster URI in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRasterRecord {
    pub product_timestamp: i64,
    pub source_crs: String,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
    pub product_type: ProductType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_index() {
        let req = BuildRequest {
            cube_id: "c1".into(),
            groups: vec![],
            bands: vec![],
            aliases: vec![AliasedProductType {
                alias: "s2".into(),
                product_type: ProductType::new("sentinel2", "safe"),
            }],
            roi: "-1,-1,1,1".into(),
            roi_crs: Crs::wgs84(),
            target_resolution_m: 10.0,
            target_crs: Crs::wgs84(),
            chunking_strategy: ChunkingStrategy::Potato,
            description: None,
            package: false,
        };
        let idx = req.alias_index();
        assert_eq!(idx.get("s2").unwrap().source, "sentinel2");
    }
}
