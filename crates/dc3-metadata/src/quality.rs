//! Quality indicators (§4.7): compactness, coverage, lightness and
//! regularity, computed per (group, product-type) leaf and aggregated
//! multiplicatively up to group/type/band/cube level.

use std::collections::{HashMap, HashSet};

use dc3_common::bbox::union_area;
use dc3_common::model::ProductType;
use dc3_common::{BandDescriptor, BoundingBox, BuildRequest, CacheHandle, Crs};
use dc3_expr::parse;
use dc3_projection::transform_point;
use serde::{Deserialize, Serialize};

use crate::error::MetadataError;

/// The three per-(group, type) indicators that multiply up the hierarchy.
/// `time_regularity` is computed once, cube-wide, and is not part of this
/// product lattice (§4.7 marks it "cube only").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub time_compacity: f64,
    pub spatial_coverage: f64,
    pub group_lightness: f64,
}

impl Indicators {
    pub fn one() -> Self {
        Self {
            time_compacity: 1.0,
            spatial_coverage: 1.0,
            group_lightness: 1.0,
        }
    }

    fn product(self, other: Indicators) -> Indicators {
        Indicators {
            time_compacity: self.time_compacity * other.time_compacity,
            spatial_coverage: self.spatial_coverage * other.spatial_coverage,
            group_lightness: self.group_lightness * other.group_lightness,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub cube: Indicators,
    /// Keyed by group timestamp (§4.7: "stored on t-coordinate attributes
    /// keyed by group timestamp").
    pub per_group: HashMap<i64, Indicators>,
    pub per_type: Vec<(ProductType, Indicators)>,
    pub time_regularity: f64,
}

fn time_compacity(timestamps: &[i64], global_t: f64) -> f64 {
    if global_t <= 0.0 {
        return 1.0;
    }
    let min = *timestamps.iter().min().expect("non-empty timestamps");
    let max = *timestamps.iter().max().expect("non-empty timestamps");
    1.0 - (max - min) as f64 / global_t
}

fn spatial_coverage(rects: &[BoundingBox], roi: &BoundingBox) -> f64 {
    let roi_area = roi.area();
    if roi_area <= 0.0 {
        return 0.0;
    }
    let clipped: Vec<BoundingBox> = rects.iter().filter_map(|r| r.intersection(roi)).collect();
    union_area(&clipped) / roi_area
}

fn group_lightness(rects: &[BoundingBox], roi: &BoundingBox) -> f64 {
    let total: f64 = rects.iter().map(|r| r.area()).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let clipped: Vec<BoundingBox> = rects.iter().filter_map(|r| r.intersection(roi)).collect();
    union_area(&clipped) / total
}

fn time_regularity(mut group_timestamps: Vec<i64>) -> f64 {
    group_timestamps.sort();
    group_timestamps.dedup();
    let n = group_timestamps.len();
    if n <= 1 {
        return 1.0;
    }
    let deltas: Vec<f64> = group_timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64)
        .collect();
    let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    if mean == 0.0 {
        return 1.0;
    }
    let variance = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / deltas.len() as f64;
    1.0 - variance.sqrt() / mean
}

fn reproject_bbox(
    record: &dc3_common::CachedRasterRecord,
    target_crs: &Crs,
) -> Result<BoundingBox, MetadataError> {
    let source_crs = Crs::new(record.source_crs.clone());
    let (x0, y0) = transform_point(&source_crs, target_crs, record.left, record.bottom)
        .map_err(|e| reprojection_error(record, e))?;
    let (x1, y1) = transform_point(&source_crs, target_crs, record.right, record.top)
        .map_err(|e| reprojection_error(record, e))?;
    Ok(BoundingBox::new(
        x0.min(x1),
        y0.min(y1),
        x0.max(x1),
        y0.max(y1),
    ))
}

fn reprojection_error(
    record: &dc3_common::CachedRasterRecord,
    e: dc3_projection::TransformError,
) -> MetadataError {
    MetadataError::ReprojectionFailed {
        uri: format!("{}@{}", record.source_crs, record.product_timestamp),
        detail: e.to_string(),
    }
}

/// Compute every quality indicator for a build: one leaf per (group
/// timestamp, product type) present in the request, aggregated up to
/// group/type/cube level, plus the cube-wide `time_regularity`.
pub fn compute_quality(
    request: &BuildRequest,
    cache: &dyn CacheHandle,
    roi_target: &BoundingBox,
    target_crs: &Crs,
) -> Result<QualityReport, MetadataError> {
    let group_timestamps: Vec<i64> = request.groups.iter().map(|g| g.timestamp).collect();
    let global_t = if request.groups.len() > 1 {
        let min = *group_timestamps.iter().min().unwrap_or(&0);
        let max = *group_timestamps.iter().max().unwrap_or(&0);
        (max - min) as f64
    } else {
        0.0
    };

    // leaf[(group_timestamp, product_type)] = that type's rasters within the group
    let mut leaves: HashMap<(i64, ProductType), Indicators> = HashMap::new();
    let mut per_type_groups: HashMap<ProductType, Vec<i64>> = HashMap::new();

    for group in &request.groups {
        let mut by_type: HashMap<ProductType, Vec<dc3_common::CachedRasterRecord>> = HashMap::new();
        for file in &group.files {
            let record = cache
                .get(&file.uri)
                .ok_or_else(|| MetadataError::MissingCacheRecord {
                    uri: file.uri.clone(),
                })?;
            by_type.entry(file.product_type.clone()).or_default().push(record);
        }

        for (product_type, records) in by_type {
            let timestamps: Vec<i64> = records.iter().map(|r| r.product_timestamp).collect();
            let rects: Vec<BoundingBox> = records
                .iter()
                .map(|r| reproject_bbox(r, target_crs))
                .collect::<Result<_, _>>()?;

            let indicators = Indicators {
                time_compacity: time_compacity(&timestamps, global_t),
                spatial_coverage: spatial_coverage(&rects, roi_target),
                group_lightness: group_lightness(&rects, roi_target),
            };

            leaves.insert((group.timestamp, product_type.clone()), indicators);
            per_type_groups.entry(product_type).or_default().push(group.timestamp);
        }
    }

    let mut per_group: HashMap<i64, Indicators> = HashMap::new();
    for group in &request.groups {
        let types_in_group: Vec<&ProductType> = leaves
            .keys()
            .filter(|(ts, _)| *ts == group.timestamp)
            .map(|(_, t)| t)
            .collect();
        let indicator = types_in_group
            .into_iter()
            .fold(Indicators::one(), |acc, t| {
                acc.product(leaves[&(group.timestamp, t.clone())])
            });
        per_group.insert(group.timestamp, indicator);
    }

    let mut per_type: Vec<(ProductType, Indicators)> = per_type_groups
        .into_iter()
        .map(|(product_type, groups)| {
            let indicator = groups.into_iter().fold(Indicators::one(), |acc, ts| {
                acc.product(leaves[&(ts, product_type.clone())])
            });
            (product_type, indicator)
        })
        .collect();
    per_type.sort_by(|a, b| (a.0.source.as_str(), a.0.format.as_str()).cmp(&(b.0.source.as_str(), b.0.format.as_str())));

    let mut sorted_group_timestamps: Vec<i64> = per_group.keys().copied().collect();
    sorted_group_timestamps.sort();
    let cube = sorted_group_timestamps
        .iter()
        .fold(Indicators::one(), |acc, ts| acc.product(per_group[ts]));

    Ok(QualityReport {
        cube,
        per_group,
        per_type,
        time_regularity: time_regularity(group_timestamps),
    })
}

/// `fill_ratio` (§4.7): mean across band variables of `1 - (#NaN /
/// total_cells)`. Bands absent from the cube (never resolved to a decoded
/// value) are skipped rather than counted as zero.
pub fn fill_ratio(cube: &dc3_common::CubeDataset, band_names: &[String]) -> f64 {
    let mut total = 0.0;
    let mut n = 0usize;
    for name in band_names {
        if let Some(arr) = cube.variables.get(name) {
            let total_cells = arr.len();
            if total_cells > 0 {
                total += 1.0 - arr.count_nan() as f64 / total_cells as f64;
                n += 1;
            }
        }
    }
    if n == 0 {
        1.0
    } else {
        total / n as f64
    }
}

/// Band indicator (§4.7): the product of type indicators for the product
/// types referenced by the band's expression.
pub fn band_indicator(
    band: &BandDescriptor,
    request: &BuildRequest,
    report: &QualityReport,
) -> Result<Indicators, MetadataError> {
    let expr = parse(&band.expression).map_err(|e| MetadataError::BadExpression {
        band: band.name.clone(),
        detail: e.to_string(),
    })?;

    let alias_index = request.alias_index();
    let mut referenced_types = HashSet::new();
    for (alias, _subband) in expr.referenced_variables() {
        if let Some(product_type) = alias_index.get(alias.as_str()) {
            referenced_types.insert((*product_type).clone());
        }
    }

    let acc = report
        .per_type
        .iter()
        .filter(|(t, _)| referenced_types.contains(t))
        .fold(Indicators::one(), |acc, (_, ind)| acc.product(*ind));
    Ok(acc)
}
