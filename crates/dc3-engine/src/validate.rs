//! Request validation, the Build Controller's first pipeline stage (§4.9).
//! Everything here raises [`BuildError::BadRequest`] (§7): "schema/constraint
//! violation, missing alias, RGB mis-assignment, ... ROI malformed".

use std::collections::HashSet;

use dc3_common::{BuildError, BuildResult, RgbChannel};
use dc3_expr::parse;
use dc3_projection::parse_roi;

/// Validate a build request before any staging work begins:
/// - at least one group and one band are declared,
/// - every raster file's product type is bound to an alias (invariant 1),
/// - every `alias.subband` token in every band expression resolves to a
///   declared alias (invariant 2),
/// - the ROI string parses,
/// - the RGB preview assignment is either absent or exactly 3 bands wide and
///   covers {RED,GREEN,BLUE} with no duplicates (invariant 3; invariant 7:
///   "RGB preview election present iff exactly 3 RGB assignments" — 1 or 2
///   assignments can never satisfy that iff).
pub fn validate_request(request: &dc3_common::BuildRequest) -> BuildResult<()> {
    if request.groups.is_empty() {
        return Err(BuildError::bad_request("request has no raster groups"));
    }
    if request.bands.is_empty() {
        return Err(BuildError::bad_request("request declares no bands"));
    }

    parse_roi(&request.roi).map_err(|e| BuildError::bad_request(format!("malformed ROI: {e}")))?;

    let alias_index = request.alias_index();
    for group in &request.groups {
        for file in &group.files {
            if !alias_index
                .values()
                .any(|product_type| **product_type == file.product_type)
            {
                return Err(BuildError::bad_request(format!(
                    "raster {} has product type {}/{} which is not bound to any alias",
                    file.uri, file.product_type.source, file.product_type.format
                )));
            }
        }
    }

    for band in &request.bands {
        let expr = parse(&band.expression)
            .map_err(|e| BuildError::bad_request(format!("band {} has invalid expression: {e}", band.name)))?;
        for (alias, subband) in expr.referenced_variables() {
            if !alias_index.contains_key(alias.as_str()) {
                return Err(BuildError::bad_request(format!(
                    "band {} references {alias}.{subband}, but {alias} is not a declared alias",
                    band.name
                )));
            }
        }
    }

    let rgb_bands = request.rgb_bands();
    let rgb_count = rgb_bands.len();
    if rgb_count != 0 && rgb_count != 3 {
        return Err(BuildError::bad_request(format!(
            "RGB preview requires exactly 3 assigned bands, found {rgb_count}"
        )));
    }
    if rgb_count == 3 {
        let channels: HashSet<RgbChannel> = rgb_bands.iter().filter_map(|b| b.rgb_channel).collect();
        if channels != HashSet::from([RgbChannel::Red, RgbChannel::Green, RgbChannel::Blue]) {
            return Err(BuildError::bad_request(
                "RGB preview requires exactly one band each for RED, GREEN and BLUE with no duplicates",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc3_common::{
        AliasedProductType, BandDescriptor, ChunkingStrategy, Crs, ProductType, RasterFile, RasterGroup,
        RgbChannel,
    };

    fn toy_file() -> RasterFile {
        RasterFile {
            id: "f1".into(),
            uri: "granule.zip".into(),
            product_type: ProductType::new("sentinel2", "safe"),
        }
    }

    fn toy_request() -> dc3_common::BuildRequest {
        dc3_common::BuildRequest {
            cube_id: "cube-1".into(),
            groups: vec![RasterGroup {
                timestamp: 0,
                files: vec![toy_file()],
            }],
            bands: vec![BandDescriptor {
                name: "ndvi".into(),
                expression: "s2.b04".into(),
                clip: None,
                rgb_channel: None,
                colormap: None,
                description: None,
                unit: None,
            }],
            aliases: vec![AliasedProductType {
                alias: "s2".into(),
                product_type: ProductType::new("sentinel2", "safe"),
            }],
            roi: "-1,-1,1,1".into(),
            roi_crs: Crs::wgs84(),
            target_resolution_m: 10.0,
            target_crs: Crs::wgs84(),
            chunking_strategy: ChunkingStrategy::Spinach,
            description: None,
            package: false,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(validate_request(&toy_request()).is_ok());
    }

    #[test]
    fn test_rejects_empty_groups() {
        let mut request = toy_request();
        request.groups.clear();
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_rejects_unaliased_product_type() {
        let mut request = toy_request();
        request.aliases.clear();
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_rejects_malformed_roi() {
        let mut request = toy_request();
        request.roi = "not a roi".into();
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_rejects_partial_rgb_assignment() {
        let mut request = toy_request();
        request.bands.push(BandDescriptor {
            name: "red".into(),
            expression: "s2.b04".into(),
            clip: None,
            rgb_channel: Some(RgbChannel::Red),
            colormap: None,
            description: None,
            unit: None,
        });
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_rejects_duplicate_rgb_channel() {
        let mut request = toy_request();
        request.bands = vec![
            BandDescriptor {
                name: "red1".into(),
                expression: "s2.b04".into(),
                clip: None,
                rgb_channel: Some(RgbChannel::Red),
                colormap: None,
                description: None,
                unit: None,
            },
            BandDescriptor {
                name: "red2".into(),
                expression: "s2.b04".into(),
                clip: None,
                rgb_channel: Some(RgbChannel::Red),
                colormap: None,
                description: None,
                unit: None,
            },
            BandDescriptor {
                name: "green".into(),
                expression: "s2.b04".into(),
                clip: None,
                rgb_channel: Some(RgbChannel::Green),
                colormap: None,
                description: None,
                unit: None,
            },
        ];
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_rejects_band_referencing_undeclared_alias() {
        let mut request = toy_request();
        request.bands[0].expression = "foo.b04".into();
        assert!(validate_request(&request).is_err());
    }
}
