//! Grid completion (C1): extend an existing coordinate array so it covers a
//! target bound, at a fixed step, landing on exactly
//! `ceil((max-min)/step)` points.

/// Extend `coords` (assumed strictly increasing, step `step`) so it covers
/// `[lower_bound, upper_bound]`, then trim/pad to exactly
/// `ceil((upper_bound - lower_bound) / step)` elements.
///
/// Mirrors the reference algorithm: prepend `arange(coords[0]-step,
/// lower_bound, -step)` reversed, append `arange(coords[-1]+step,
/// upper_bound, step)`, then adjust length by adding/removing from whichever
/// side sits further from its bound.
pub fn complete_grid(coords: &[f64], step: f64, lower_bound: f64, upper_bound: f64) -> Vec<f64> {
    assert!(step > 0.0, "grid step must be positive");
    assert!(!coords.is_empty(), "coords must be non-empty");

    let mut prefix = Vec::new();
    let mut cursor = coords[0] - step;
    while cursor > lower_bound {
        prefix.push(cursor);
        cursor -= step;
    }
    prefix.reverse();

    let mut suffix = Vec::new();
    let mut cursor = coords[coords.len() - 1] + step;
    while cursor < upper_bound {
        suffix.push(cursor);
        cursor += step;
    }

    let mut extended = Vec::with_capacity(prefix.len() + coords.len() + suffix.len());
    extended.extend(prefix);
    extended.extend_from_slice(coords);
    extended.extend(suffix);

    let target_len = ((upper_bound - lower_bound) / step).ceil() as usize;

    while extended.len() > target_len {
        let dist_front = (extended[0] - lower_bound).abs();
        let dist_back = (extended[extended.len() - 1] - upper_bound).abs();
        if dist_front >= dist_back {
            extended.remove(0);
        } else {
            extended.pop();
        }
    }

    while extended.len() < target_len {
        let dist_front = (extended[0] - lower_bound).abs();
        let dist_back = (extended[extended.len() - 1] - upper_bound).abs();
        if dist_front >= dist_back {
            let next = extended[0] - step;
            extended.insert(0, next);
        } else {
            let next = extended[extended.len() - 1] + step;
            extended.push(next);
        }
    }

    extended
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_to_exact_cardinality() {
        let coords = vec![0.0, 1.0, 2.0];
        let extended = complete_grid(&coords, 1.0, -2.0, 5.0);
        assert_eq!(extended.len(), 7);
        for w in extended.windows(2) {
            assert!((w[1] - w[0] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_already_exact_cardinality_is_a_noop() {
        let coords = vec![0.0, 1.0, 2.0, 3.0];
        let extended = complete_grid(&coords, 1.0, 0.0, 4.0);
        assert_eq!(extended.len(), 4);
        assert_eq!(extended, coords);
    }

    #[test]
    fn test_monotone_increasing() {
        let coords = vec![10.0, 10.5, 11.0];
        let extended = complete_grid(&coords, 0.5, 8.0, 13.0);
        for w in extended.windows(2) {
            assert!(w[1] > w[0]);
        }
    }
}
