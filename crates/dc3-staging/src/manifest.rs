//! Generic acquisition manifest parsing (§4.3 step 1-2). Real GeoTIFF/JP2
//! decoders are absent from the teacher's stack, so the raster format
//! registry (`dc3-staging::decoder`) is built against a generic archive
//! shape instead: an XML manifest (parsed here via `quick-xml`, already a
//! teacher dependency per `crates/ingestion`'s GRIB/NetCDF handling) plus raw
//! little-endian `f32` band payloads as sibling archive entries. See
//! DESIGN.md for the full rationale.

use serde::Deserialize;

use crate::error::StagingError;

#[derive(Debug, Deserialize)]
struct AcquisitionXml {
    start: Option<i64>,
    stop: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BoundsXml {
    #[serde(rename = "@left")]
    left: f64,
    #[serde(rename = "@bottom")]
    bottom: f64,
    #[serde(rename = "@right")]
    right: f64,
    #[serde(rename = "@top")]
    top: f64,
}

#[derive(Debug, Deserialize)]
struct VariantXml {
    #[serde(rename = "@resolution_m")]
    resolution_m: f64,
    #[serde(rename = "@width")]
    width: usize,
    #[serde(rename = "@height")]
    height: usize,
    #[serde(rename = "@entry")]
    entry: String,
}

#[derive(Debug, Deserialize)]
struct SubbandXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "variant", default)]
    variants: Vec<VariantXml>,
}

#[derive(Debug, Deserialize)]
struct SubbandsXml {
    #[serde(rename = "subband", default)]
    subband: Vec<SubbandXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "granuleManifest")]
struct GranuleManifestXml {
    acquisition: AcquisitionXml,
    crs: String,
    bounds: BoundsXml,
    subbands: SubbandsXml,
}

/// One available resolution of a subband, located by its archive entry name.
#[derive(Debug, Clone)]
pub struct SubbandVariant {
    pub resolution_m: f64,
    pub width: usize,
    pub height: usize,
    pub entry: String,
}

/// One subband's full set of resolution variants (e.g. Sentinel-2's B02 at
/// 10m/20m/60m).
#[derive(Debug, Clone)]
pub struct SubbandManifestEntry {
    pub name: String,
    pub variants: Vec<SubbandVariant>,
}

/// Parsed acquisition manifest for one granule archive.
#[derive(Debug, Clone)]
pub struct GranuleManifest {
    pub acquisition_start: Option<i64>,
    pub acquisition_stop: Option<i64>,
    pub source_crs: String,
    /// Granule bounds in `source_crs`.
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
    pub subbands: Vec<SubbandManifestEntry>,
}

impl GranuleManifest {
    pub fn parse(xml: &str) -> Result<Self, StagingError> {
        let raw: GranuleManifestXml = quick_xml::de::from_str(xml)?;
        Ok(GranuleManifest {
            acquisition_start: raw.acquisition.start,
            acquisition_stop: raw.acquisition.stop,
            source_crs: raw.crs,
            left: raw.bounds.left,
            bottom: raw.bounds.bottom,
            right: raw.bounds.right,
            top: raw.bounds.top,
            subbands: raw
                .subbands
                .subband
                .into_iter()
                .map(|s| SubbandManifestEntry {
                    name: s.name,
                    variants: s
                        .variants
                        .into_iter()
                        .map(|v| SubbandVariant {
                            resolution_m: v.resolution_m,
                            width: v.width,
                            height: v.height,
                            entry: v.entry,
                        })
                        .collect(),
                })
                .collect(),
        })
    }

    /// Product acquisition timestamp: the midpoint of start/stop where both
    /// are present (§4.3 step 2); missing either bound is a hard
    /// `DownloadError` at the caller.
    pub fn acquisition_timestamp(&self) -> Option<i64> {
        match (self.acquisition_start, self.acquisition_stop) {
            (Some(start), Some(stop)) => Some((start + stop) / 2),
            (Some(t), None) | (None, Some(t)) => Some(t),
            (None, None) => None,
        }
    }

    pub fn subband(&self, name: &str) -> Option<&SubbandManifestEntry> {
        self.subbands.iter().find(|s| s.name == name)
    }
}

/// Among a subband's variants, resolve "the highest available resolution ≥
/// target" (§4.3 step 3), matching
/// `examples/original_source/datacube/core/rasters/drivers/sentinel2_level2A_safe.py`:
/// the coarsest variant whose `resolution_m` is still no coarser than
/// `target_resolution_m` (i.e. the largest `resolution_m` that is `<=`
/// target). If every variant is finer than the target (all `resolution_m`
/// above it), fall back to the overall finest variant rather than failing —
/// the request still gets the best data available.
pub fn resolve_variant<'a>(
    entry: &'a SubbandManifestEntry,
    target_resolution_m: f64,
) -> Option<&'a SubbandVariant> {
    let at_or_finer = entry
        .variants
        .iter()
        .filter(|v| v.resolution_m <= target_resolution_m)
        .max_by(|a, b| a.resolution_m.partial_cmp(&b.resolution_m).unwrap());

    at_or_finer.or_else(|| {
        entry
            .variants
            .iter()
            .min_by(|a, b| a.resolution_m.partial_cmp(&b.resolution_m).unwrap())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <granuleManifest>
            <acquisition><start>1700000000</start><stop>1700000010</stop></acquisition>
            <crs>EPSG:32631</crs>
            <bounds left="499980" bottom="4790220" right="609780" top="4900020"/>
            <subbands>
                <subband name="B04">
                    <variant resolution_m="10" width="10980" height="10980" entry="IMG_DATA/B04_10m.bin"/>
                    <variant resolution_m="20" width="5490" height="5490" entry="IMG_DATA/B04_20m.bin"/>
                </subband>
            </subbands>
        </granuleManifest>
    "#;

    #[test]
    fn test_parse_manifest_and_midpoint_timestamp() {
        let manifest = GranuleManifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.source_crs, "EPSG:32631");
        assert_eq!(manifest.acquisition_timestamp(), Some(1700000005));
        assert_eq!(manifest.subbands.len(), 1);
    }

    #[test]
    fn test_resolve_variant_prefers_coarsest_at_or_finer_than_target() {
        let manifest = GranuleManifest::parse(SAMPLE).unwrap();
        let entry = manifest.subband("B04").unwrap();
        let variant = resolve_variant(entry, 15.0).unwrap();
        assert_eq!(variant.resolution_m, 10.0);

        let variant = resolve_variant(entry, 25.0).unwrap();
        assert_eq!(variant.resolution_m, 20.0);
    }

    #[test]
    fn test_resolve_variant_falls_back_to_finest_when_none_at_or_finer() {
        let manifest = GranuleManifest::parse(SAMPLE).unwrap();
        let entry = manifest.subband("B04").unwrap();
        let variant = resolve_variant(entry, 5.0).unwrap();
        assert_eq!(variant.resolution_m, 10.0);
    }
}
