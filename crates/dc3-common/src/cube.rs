//! The materialized cube (x, y, t) that results from temporal concatenation
//! (C5), is mutated in place by expression evaluation (C6), described by
//! metadata (C7), and persisted by the Cube Writer (C8).
//!
//! Kept separate from [`crate::bbox`]/the per-timestamp working dataset used
//! internally by C3-C5 (`dc3_algebra::Dataset`, x/y + 2-D variables): once
//! timestamps are stacked there is a third axis, and every downstream
//! consumer (expression evaluator, metadata, writer) wants the same 3-D
//! shape, so it lives here in the zero-dependency base crate rather than in
//! `dc3-algebra` (which is scoped to C4's 2-D mosaic algebra).

use std::collections::HashMap;

/// A dense (x, y, t)-indexed array of `f64`, `NaN` standing in for missing
/// cells. Row-major in (t, y, x) order: `data[((t * ny) + y) * nx + x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Array3 {
    data: Vec<f64>,
    nx: usize,
    ny: usize,
    nt: usize,
}

impl Array3 {
    pub fn filled(nx: usize, ny: usize, nt: usize, value: f64) -> Self {
        Self {
            data: vec![value; nx * ny * nt],
            nx,
            ny,
            nt,
        }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nt)
    }

    #[inline]
    fn index(&self, x: usize, y: usize, t: usize) -> usize {
        (t * self.ny + y) * self.nx + x
    }

    pub fn get(&self, x: usize, y: usize, t: usize) -> f64 {
        self.data[self.index(x, y, t)]
    }

    pub fn set(&mut self, x: usize, y: usize, t: usize, value: f64) {
        let idx = self.index(x, y, t);
        self.data[idx] = value;
    }

    /// Set the full (x, y) slice for a given `t` from a row-major `x`-fastest
    /// buffer, as produced by the per-timestamp mosaic/stack (C5).
    pub fn set_slice(&mut self, t: usize, slice: &[f64]) {
        assert_eq!(slice.len(), self.nx * self.ny);
        let start = t * self.nx * self.ny;
        self.data[start..start + self.nx * self.ny].copy_from_slice(slice);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn min_max_ignoring_nan(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut any = false;
        for &v in &self.data {
            if v.is_nan() {
                continue;
            }
            any = true;
            min = min.min(v);
            max = max.max(v);
        }
        any.then_some((min, max))
    }

    pub fn clip(&mut self, min: f64, max: f64) {
        for v in &mut self.data {
            if !v.is_nan() {
                *v = v.clamp(min, max);
            }
        }
    }

    pub fn count_nan(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elementwise binary operation between two arrays of equal shape.
    pub fn zip_with(&self, other: &Array3, f: impl Fn(f64, f64) -> f64) -> Array3 {
        assert_eq!((self.nx, self.ny, self.nt), other.dims());
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Array3 {
            data,
            nx: self.nx,
            ny: self.ny,
            nt: self.nt,
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Array3 {
        Array3 {
            data: self.data.iter().map(|&v| f(v)).collect(),
            nx: self.nx,
            ny: self.ny,
            nt: self.nt,
        }
    }
}

/// The final, fully materialized cube: coordinate arrays plus one
/// [`Array3`] per variable. `x`/`y` are the master grid's coordinates
/// (invariant 6); `t` is the sorted, distinct sequence of group timestamps.
#[derive(Debug, Clone)]
pub struct CubeDataset {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub t: Vec<i64>,
    pub variables: HashMap<String, Array3>,
}

impl CubeDataset {
    pub fn new(x: Vec<f64>, y: Vec<f64>, t: Vec<i64>) -> Self {
        Self {
            x,
            y,
            t,
            variables: HashMap::new(),
        }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.x.len(), self.y.len(), self.t.len())
    }

    /// Drop every variable not in `keep`, per C6's final step ("restrict the
    /// cube's variable set to exactly the declared band names").
    pub fn retain_variables(&mut self, keep: &[String]) {
        self.variables.retain(|name, _| keep.contains(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array3_index_roundtrip() {
        let mut a = Array3::filled(2, 3, 2, 0.0);
        a.set(1, 2, 1, 42.0);
        assert_eq!(a.get(1, 2, 1), 42.0);
        assert_eq!(a.get(0, 0, 0), 0.0);
    }

    #[test]
    fn test_set_slice() {
        let mut a = Array3::filled(2, 2, 2, 0.0);
        a.set_slice(1, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a.get(0, 0, 1), 1.0);
        assert_eq!(a.get(1, 1, 1), 4.0);
        assert_eq!(a.get(0, 0, 0), 0.0);
    }

    #[test]
    fn test_min_max_ignores_nan() {
        let mut a = Array3::filled(2, 1, 1, f64::NAN);
        a.set(0, 0, 0, 5.0);
        a.set(1, 0, 0, -3.0);
        assert_eq!(a.min_max_ignoring_nan(), Some((-3.0, 5.0)));
    }

    #[test]
    fn test_clip_leaves_nan_alone() {
        let mut a = Array3::filled(2, 1, 1, f64::NAN);
        a.set(0, 0, 0, 10.0);
        a.clip(-1.0, 1.0);
        assert_eq!(a.get(0, 0, 0), 1.0);
        assert!(a.get(1, 0, 0).is_nan());
    }

    #[test]
    fn test_retain_variables() {
        let mut cube = CubeDataset::new(vec![0.0], vec![0.0], vec![1]);
        cube.variables
            .insert("a".into(), Array3::filled(1, 1, 1, 1.0));
        cube.variables
            .insert("b".into(), Array3::filled(1, 1, 1, 2.0));
        cube.retain_variables(&["a".to_string()]);
        assert!(cube.variables.contains_key("a"));
        assert!(!cube.variables.contains_key("b"));
    }
}
