//! Turns a [`BuildRequest`]'s band expressions and aliases into the
//! per-alias `subbands_required` maps the Raster Stager (C3) needs, plus the
//! global set of `alias.subband` variable names the whole cube must carry
//! before C6 evaluates band expressions.

use std::collections::HashMap;

use dc3_common::model::ProductType;
use dc3_common::BuildRequest;
use dc3_expr::parse;

use crate::error::OrchestratorError;

/// `alias.subband` -> `subbands_required` map (`{"alias.subband": "subband"}`)
/// for every alias referenced by at least one band expression, plus the flat
/// set of all `alias.subband` variable names across the whole request.
pub struct RequestPlan {
    pub per_alias_subbands: HashMap<String, HashMap<String, String>>,
    pub all_variable_names: Vec<String>,
}

pub fn plan_request(request: &BuildRequest) -> Result<RequestPlan, OrchestratorError> {
    let mut per_alias: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut all_names = Vec::new();

    for band in &request.bands {
        let expr = parse(&band.expression).map_err(|e| OrchestratorError::BadExpression {
            band: band.name.clone(),
            detail: e.to_string(),
        })?;

        for (alias, subband) in expr.referenced_variables() {
            let variable_name = format!("{alias}.{subband}");
            per_alias
                .entry(alias)
                .or_default()
                .insert(variable_name.clone(), subband);
            if !all_names.contains(&variable_name) {
                all_names.push(variable_name);
            }
        }
    }

    Ok(RequestPlan {
        per_alias_subbands: per_alias,
        all_variable_names: all_names,
    })
}

/// Resolve the alias bound to `product_type`, per invariant 1 ("every file's
/// product type is aliased").
pub fn alias_for_product_type<'a>(
    request: &'a BuildRequest,
    uri: &str,
    product_type: &ProductType,
) -> Result<&'a str, OrchestratorError> {
    request
        .aliases
        .iter()
        .find(|a| &a.product_type == product_type)
        .map(|a| a.alias.as_str())
        .ok_or_else(|| OrchestratorError::UnknownAlias {
            uri: uri.to_string(),
            source: product_type.source.clone(),
            format: product_type.format.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc3_common::model::{AliasedProductType, BandDescriptor, RasterFile};
    use dc3_common::{ChunkingStrategy, Crs};

    fn toy_request() -> BuildRequest {
        BuildRequest {
            cube_id: "c1".into(),
            groups: vec![],
            bands: vec![BandDescriptor {
                name: "ndvi".into(),
                expression: "(s2.b08 - s2.b04) / (s2.b08 + s2.b04)".into(),
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
            chunking_strategy: ChunkingStrategy::Potato,
            description: None,
            package: false,
        }
    }

    #[test]
    fn test_plan_collects_both_subbands() {
        let plan = plan_request(&toy_request()).unwrap();
        let s2 = plan.per_alias_subbands.get("s2").unwrap();
        assert_eq!(s2.get("s2.b08").unwrap(), "b08");
        assert_eq!(s2.get("s2.b04").unwrap(), "b04");
        assert_eq!(plan.all_variable_names.len(), 2);
    }

    #[test]
    fn test_alias_for_product_type_found() {
        let request = toy_request();
        let raster = RasterFile {
            id: "f1".into(),
            uri: "granule.zip".into(),
            product_type: ProductType::new("sentinel2", "safe"),
        };
        let alias = alias_for_product_type(&request, &raster.uri, &raster.product_type).unwrap();
        assert_eq!(alias, "s2");
    }

    #[test]
    fn test_alias_for_product_type_missing() {
        let request = toy_request();
        let unknown = ProductType::new("landsat8", "geotiff");
        assert!(alias_for_product_type(&request, "x.zip", &unknown).is_err());
    }
}
