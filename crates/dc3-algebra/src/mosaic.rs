//! Dataset Algebra (C4): intersection classification, schema-aware merge,
//! and the recursive overlap mosaic.
//!
//! Ported from the reference `_mosaicking`/`intersect`/`merge_datasets`
//! algorithm, which splits two overlapping rectangles into three strips
//! (exterior of one / overlap / exterior of the other) and recurses only on
//! the overlap, terminating once the recursive call hits `SAME` or no
//! intersection.

use std::collections::HashSet;

use dc3_common::BoundingBox;

use crate::dataset::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntersectionType {
    Left,
    Bottom,
    Right,
    Top,
}

/// `None` means the two datasets cover exactly the same extent (`SAME`);
/// `Some(set)` lists which edges overlap (empty set means disjoint).
pub fn intersect(a: &BoundingBox, b: &BoundingBox) -> Option<HashSet<IntersectionType>> {
    if *a == *b {
        return None;
    }

    let mut set = HashSet::new();
    if a.min_x < b.max_x && b.max_x < a.max_x {
        set.insert(IntersectionType::Left);
    }
    if a.min_y < b.max_y && b.max_y < a.max_y {
        set.insert(IntersectionType::Bottom);
    }
    if a.min_x < b.min_x && b.min_x < a.max_x {
        set.insert(IntersectionType::Right);
    }
    if a.min_y < b.min_y && b.min_y < a.max_y {
        set.insert(IntersectionType::Top);
    }
    Some(set)
}

/// Recursively mosaic two datasets that may share geographic extent.
pub fn mosaic(first: &Dataset, second: &Dataset) -> Dataset {
    let first_bounds = first.bounds();
    let second_bounds = second.bounds();

    let types = match intersect(&first_bounds, &second_bounds) {
        None => {
            // SAME: later product_timestamp wins; the loser fills the
            // winner's NaN cells.
            return if first.product_timestamp >= second.product_timestamp {
                let mut merged = first.clone();
                for (name, grid) in &mut merged.variables {
                    if let Some(other) = second.variables.get(name) {
                        *grid = grid.combine_first(other);
                    }
                }
                merged.product_timestamp = first.product_timestamp;
                merged
            } else {
                let mut merged = second.clone();
                for (name, grid) in &mut merged.variables {
                    if let Some(other) = first.variables.get(name) {
                        *grid = grid.combine_first(other);
                    }
                }
                merged.product_timestamp = second.product_timestamp;
                merged
            };
        }
        Some(types) => types,
    };

    if types.is_empty() {
        return Dataset::combine_by_coords(first, second);
    }

    // Counter-clockwise preference: LEFT, BOTTOM, RIGHT, TOP.
    if types.contains(&IntersectionType::Left) {
        let left = second.select_x(|x| x < first_bounds.min_x);
        let first_overlap = first.select_x(|x| x <= second_bounds.max_x);
        let second_overlap = second.select_x(|x| x >= first_bounds.min_x);
        let overlap = mosaic(&first_overlap, &second_overlap);
        let right = first.select_x(|x| x > second_bounds.max_x);
        return if left.x.is_empty() {
            Dataset::concat_x(&[&overlap, &right])
        } else {
            Dataset::concat_x(&[&left, &overlap, &right])
        };
    }

    if types.contains(&IntersectionType::Bottom) {
        let bottom = second.select_y(|y| y < first_bounds.min_y);
        let first_overlap = first.select_y(|y| y <= second_bounds.max_y);
        let second_overlap = second.select_y(|y| y >= first_bounds.min_y);
        let overlap = mosaic(&first_overlap, &second_overlap);
        let top = first.select_y(|y| y > second_bounds.max_y);
        return if bottom.y.is_empty() {
            Dataset::concat_y(&[&overlap, &top])
        } else {
            Dataset::concat_y(&[&bottom, &overlap, &top])
        };
    }

    if types.contains(&IntersectionType::Right) {
        let left = first.select_x(|x| x < second_bounds.min_x);
        let first_overlap = first.select_x(|x| x >= second_bounds.min_x);
        let second_overlap = second.select_x(|x| x <= first_bounds.max_x);
        let overlap = mosaic(&first_overlap, &second_overlap);
        let right = second.select_x(|x| x > first_bounds.max_x);
        return if right.x.is_empty() {
            Dataset::concat_x(&[&left, &overlap])
        } else {
            Dataset::concat_x(&[&left, &overlap, &right])
        };
    }

    debug_assert!(types.contains(&IntersectionType::Top));
    let bottom = first.select_y(|y| y < second_bounds.min_y);
    let first_overlap = first.select_y(|y| y >= second_bounds.min_y);
    let second_overlap = second.select_y(|y| y <= first_bounds.max_y);
    let overlap = mosaic(&first_overlap, &second_overlap);
    let top = second.select_y(|y| y > first_bounds.max_y);
    if top.y.is_empty() {
        Dataset::concat_y(&[&bottom, &overlap])
    } else {
        Dataset::concat_y(&[&bottom, &overlap, &top])
    }
}

/// Schema-aware merge: bands common to both datasets are mosaicked; bands
/// unique to either side are carried through untouched.
pub fn merge_datasets(first: &Dataset, second: &Dataset) -> Dataset {
    let common: Vec<String> = first
        .variables
        .keys()
        .filter(|k| second.variables.contains_key(*k))
        .cloned()
        .collect();

    if common.is_empty() {
        return Dataset::combine_by_coords(first, second);
    }

    let common_first = subset_variables(first, &common);
    let common_second = subset_variables(second, &common);
    let mosaicked = mosaic(&common_first, &common_second);

    let rest_first = subset_variables_excluding(first, &common);
    let rest_second = subset_variables_excluding(second, &common);

    let merged = Dataset::combine_by_coords(&mosaicked, &rest_first);
    Dataset::combine_by_coords(&merged, &rest_second)
}

fn subset_variables(ds: &Dataset, names: &[String]) -> Dataset {
    let variables = ds
        .variables
        .iter()
        .filter(|(k, _)| names.contains(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Dataset {
        x: ds.x.clone(),
        y: ds.y.clone(),
        product_timestamp: ds.product_timestamp,
        variables,
    }
}

fn subset_variables_excluding(ds: &Dataset, names: &[String]) -> Dataset {
    let variables = ds
        .variables
        .iter()
        .filter(|(k, _)| !names.contains(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Dataset {
        x: ds.x.clone(),
        y: ds.y.clone(),
        product_timestamp: ds.product_timestamp,
        variables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid2d::Grid2D;
    use std::collections::HashMap;

    fn toy(x: Vec<f64>, y: Vec<f64>, band: &str, value: f64, ts: i64) -> Dataset {
        let grid = Grid2D::filled(x.len(), y.len(), value);
        let mut variables = HashMap::new();
        variables.insert(band.to_string(), grid);
        Dataset {
            x,
            y,
            product_timestamp: ts,
            variables,
        }
    }

    #[test]
    fn test_intersect_same() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(intersect(&a, &a).is_none());
    }

    #[test]
    fn test_intersect_left() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(-5.0, 0.0, 5.0, 10.0);
        let types = intersect(&a, &b).unwrap();
        assert!(types.contains(&IntersectionType::Left));
    }

    #[test]
    fn test_mosaic_same_extent_newer_wins() {
        let older = toy(vec![0.0, 1.0], vec![0.0], "b", 1.0, 100);
        let newer = toy(vec![0.0, 1.0], vec![0.0], "b", 2.0, 200);
        let result = mosaic(&older, &newer);
        assert_eq!(result.product_timestamp, 200);
        assert_eq!(result.variables["b"].get(0, 0), 2.0);
    }

    #[test]
    fn test_mosaic_same_extent_fills_gaps_from_loser() {
        let mut older = toy(vec![0.0, 1.0], vec![0.0], "b", 1.0, 100);
        let mut newer = toy(vec![0.0, 1.0], vec![0.0], "b", f64::NAN, 200);
        newer.variables.get_mut("b").unwrap().set(0, 1, 9.0);
        older.variables.get_mut("b").unwrap().set(0, 0, 3.0);
        let result = mosaic(&older, &newer);
        // newer wins overall attrs, but NaN cells fall back to older.
        assert_eq!(result.product_timestamp, 200);
        assert_eq!(result.variables["b"].get(0, 0), 3.0);
        assert_eq!(result.variables["b"].get(0, 1), 9.0);
    }

    #[test]
    fn test_mosaic_left_split_concatenates_in_order() {
        let a = toy(vec![0.0, 1.0, 2.0], vec![0.0], "b", 1.0, 1);
        let b = toy(vec![-1.0, 0.0, 1.0], vec![0.0], "b", 2.0, 2);
        let result = mosaic(&a, &b);
        assert_eq!(result.x, vec![-1.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_merge_datasets_disjoint_bands_no_mosaic() {
        let a = toy(vec![0.0, 1.0], vec![0.0], "temp", 1.0, 1);
        let b = toy(vec![0.0, 1.0], vec![0.0], "wind", 2.0, 1);
        let merged = merge_datasets(&a, &b);
        assert!(merged.variables.contains_key("temp"));
        assert!(merged.variables.contains_key("wind"));
    }
}
