//! The intermediate dataset representation C4/C5 operate on: ascending x/y
//! coordinate arrays, one [`Grid2D`] per variable, and a `product_timestamp`
//! attribute used to break SAME-extent ties.

use std::collections::{BTreeMap, HashMap};

use dc3_common::BoundingBox;

use crate::grid2d::Grid2D;

#[derive(Debug, Clone)]
pub struct Dataset {
    /// Strictly increasing (invariant 4).
    pub x: Vec<f64>,
    /// Strictly increasing (invariant 4).
    pub y: Vec<f64>,
    pub product_timestamp: i64,
    /// Every grid has width == x.len(), height == y.len().
    pub variables: HashMap<String, Grid2D>,
}

impl Dataset {
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            *self.x.first().expect("non-empty x"),
            *self.y.first().expect("non-empty y"),
            *self.x.last().expect("non-empty x"),
            *self.y.last().expect("non-empty y"),
        )
    }

    pub(crate) fn select_x(&self, keep: impl Fn(f64) -> bool) -> Dataset {
        let idx: Vec<usize> = self
            .x
            .iter()
            .enumerate()
            .filter(|(_, &v)| keep(v))
            .map(|(i, _)| i)
            .collect();
        let x: Vec<f64> = idx.iter().map(|&i| self.x[i]).collect();
        let variables = self
            .variables
            .iter()
            .map(|(name, grid)| (name.clone(), grid.select_cols(&idx)))
            .collect();
        Dataset {
            x,
            y: self.y.clone(),
            product_timestamp: self.product_timestamp,
            variables,
        }
    }

    pub(crate) fn select_y(&self, keep: impl Fn(f64) -> bool) -> Dataset {
        let idx: Vec<usize> = self
            .y
            .iter()
            .enumerate()
            .filter(|(_, &v)| keep(v))
            .map(|(i, _)| i)
            .collect();
        let y: Vec<f64> = idx.iter().map(|&i| self.y[i]).collect();
        let variables = self
            .variables
            .iter()
            .map(|(name, grid)| (name.clone(), grid.select_rows(&idx)))
            .collect();
        Dataset {
            x: self.x.clone(),
            y,
            product_timestamp: self.product_timestamp,
            variables,
        }
    }

    /// Concatenate datasets side by side along x. Inputs must be given in
    /// ascending-x order and share the same y axis and variable set.
    pub(crate) fn concat_x(parts: &[&Dataset]) -> Dataset {
        let non_empty: Vec<&&Dataset> = parts.iter().filter(|d| !d.x.is_empty()).collect();
        let first = *non_empty[0];
        let mut x = Vec::new();
        for d in &non_empty {
            x.extend_from_slice(&d.x);
        }
        let mut variables = HashMap::new();
        for name in first.variables.keys() {
            let grids: Vec<&Grid2D> = non_empty.iter().map(|d| &d.variables[name]).collect();
            variables.insert(name.clone(), Grid2D::concat_cols(&grids));
        }
        Dataset {
            x,
            y: first.y.clone(),
            product_timestamp: first.product_timestamp,
            variables,
        }
    }

    /// Concatenate datasets top to bottom along y. Inputs must be given in
    /// ascending-y order and share the same x axis and variable set.
    pub(crate) fn concat_y(parts: &[&Dataset]) -> Dataset {
        let non_empty: Vec<&&Dataset> = parts.iter().filter(|d| !d.y.is_empty()).collect();
        let first = *non_empty[0];
        let mut y = Vec::new();
        for d in &non_empty {
            y.extend_from_slice(&d.y);
        }
        let mut variables = HashMap::new();
        for name in first.variables.keys() {
            let grids: Vec<&Grid2D> = non_empty.iter().map(|d| &d.variables[name]).collect();
            variables.insert(name.clone(), Grid2D::concat_rows(&grids));
        }
        Dataset {
            x: first.x.clone(),
            y,
            product_timestamp: first.product_timestamp,
            variables,
        }
    }

    /// Coordinate-combined union of two datasets sharing the same variable
    /// set: build the sorted-unique union of x and y, place each input's
    /// values at their matching coordinates, NaN elsewhere, then overlay
    /// `self` over `other` (later-wins is `self`, matching
    /// `combine_by_coords`'s last-writer-wins semantics for overlapping
    /// cells — callers only reach this path from disjoint or edge-touching
    /// geometry, so overlap here is a coordinate rounding artifact at most).
    pub fn combine_by_coords(a: &Dataset, b: &Dataset) -> Dataset {
        let union_x = sorted_unique_union(&a.x, &b.x);
        let union_y = sorted_unique_union(&a.y, &b.y);

        let x_index: HashMap<ordered_float_key, usize> = index_of(&union_x);
        let y_index: HashMap<ordered_float_key, usize> = index_of(&union_y);

        let mut names: Vec<String> = a.variables.keys().cloned().collect();
        for name in b.variables.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }

        let mut variables = HashMap::new();
        for name in names {
            let mut grid = Grid2D::filled(union_x.len(), union_y.len(), f64::NAN);
            if let Some(g) = b.variables.get(&name) {
                overlay(&mut grid, g, &b.x, &b.y, &x_index, &y_index);
            }
            if let Some(g) = a.variables.get(&name) {
                overlay(&mut grid, g, &a.x, &a.y, &x_index, &y_index);
            }
            variables.insert(name, grid);
        }

        Dataset {
            x: union_x,
            y: union_y,
            product_timestamp: a.product_timestamp.max(b.product_timestamp),
            variables,
        }
    }
}

#[allow(non_camel_case_types)]
type ordered_float_key = u64;

fn key(v: f64) -> ordered_float_key {
    v.to_bits()
}

fn sorted_unique_union(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut set: BTreeMap<ordered_float_key, f64> = BTreeMap::new();
    for &v in a.iter().chain(b.iter()) {
        set.insert(key(v), v);
    }
    let mut values: Vec<f64> = set.into_values().collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    values
}

fn index_of(values: &[f64]) -> HashMap<ordered_float_key, usize> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (key(v), i))
        .collect()
}

fn overlay(
    dst: &mut Grid2D,
    src: &Grid2D,
    src_x: &[f64],
    src_y: &[f64],
    x_index: &HashMap<ordered_float_key, usize>,
    y_index: &HashMap<ordered_float_key, usize>,
) {
    for (row, &yv) in src_y.iter().enumerate() {
        let Some(&dst_row) = y_index.get(&key(yv)) else {
            continue;
        };
        for (col, &xv) in src_x.iter().enumerate() {
            let Some(&dst_col) = x_index.get(&key(xv)) else {
                continue;
            };
            let v = src.get(row, col);
            if !v.is_nan() {
                dst.set(dst_row, dst_col, v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_bounds() {
        let ds = toy(vec![1.0, 2.0, 3.0], vec![10.0, 20.0], "b", 1.0, 0);
        let b = ds.bounds();
        assert_eq!(b, BoundingBox::new(1.0, 10.0, 3.0, 20.0));
    }

    #[test]
    fn test_select_x_preserves_matching_columns() {
        let mut ds = toy(vec![1.0, 2.0, 3.0], vec![10.0], "b", 0.0, 0);
        ds.variables
            .get_mut("b")
            .unwrap()
            .set(0, 1, 7.0);
        let selected = ds.select_x(|v| v >= 2.0);
        assert_eq!(selected.x, vec![2.0, 3.0]);
        assert_eq!(selected.variables["b"].get(0, 0), 7.0);
    }

    #[test]
    fn test_combine_by_coords_places_disjoint_regions() {
        let a = toy(vec![0.0, 1.0], vec![0.0], "b", 5.0, 1);
        let b = toy(vec![2.0, 3.0], vec![0.0], "b", 9.0, 2);
        let combined = Dataset::combine_by_coords(&a, &b);
        assert_eq!(combined.x, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(combined.variables["b"].get(0, 0), 5.0);
        assert_eq!(combined.variables["b"].get(0, 3), 9.0);
    }

    #[test]
    fn test_concat_x_roundtrip() {
        let a = toy(vec![0.0, 1.0], vec![0.0], "b", 1.0, 0);
        let b = toy(vec![2.0, 3.0], vec![0.0], "b", 2.0, 0);
        let joined = Dataset::concat_x(&[&a, &b]);
        assert_eq!(joined.x, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(joined.variables["b"].get(0, 0), 1.0);
        assert_eq!(joined.variables["b"].get(0, 2), 2.0);
    }
}
