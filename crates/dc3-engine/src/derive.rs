//! Expression Evaluator integration (C6): turns the cube's staged
//! `alias.subband` variables into the request's declared band names by
//! evaluating each band's expression and applying its optional clip bounds,
//! then restricts the cube to exactly those band names.

use std::collections::HashMap;

use dc3_common::{BandDescriptor, BuildError, BuildResult, CubeDataset};
use dc3_expr::{evaluate, parse};

/// Evaluate every declared band's expression against `cube`'s staged
/// variables and replace the variable set with the band-named results.
/// Coordinate arrays (`cube.x`/`cube.y`/`cube.t`) are untouched; only
/// `cube.variables` changes.
pub fn derive_bands(cube: &mut CubeDataset, bands: &[BandDescriptor]) -> BuildResult<()> {
    let shape = cube.dims();
    let mut derived = HashMap::with_capacity(bands.len());

    for band in bands {
        let expr = parse(&band.expression).map_err(BuildError::from)?;
        let mut array = evaluate(&expr, &cube.variables, shape).map_err(BuildError::from)?;
        if let Some((lo, hi)) = band.clip {
            array.clip(lo, hi);
        }
        derived.insert(band.name.clone(), array);
    }

    cube.variables = derived;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc3_common::Array3;

    fn band(name: &str, expression: &str, clip: Option<(f64, f64)>) -> BandDescriptor {
        BandDescriptor {
            name: name.into(),
            expression: expression.into(),
            clip,
            rgb_channel: None,
            colormap: None,
            description: None,
            unit: None,
        }
    }

    #[test]
    fn test_derive_bands_evaluates_and_renames() {
        let mut cube = CubeDataset::new(vec![0.0, 1.0], vec![0.0], vec![0]);
        cube.variables.insert("s2.b08".into(), Array3::filled(2, 1, 1, 0.8));
        cube.variables.insert("s2.b04".into(), Array3::filled(2, 1, 1, 0.2));

        let bands = vec![band("ndvi", "(s2.b08 - s2.b04) / (s2.b08 + s2.b04)", None)];
        derive_bands(&mut cube, &bands).unwrap();

        assert!(cube.variables.contains_key("ndvi"));
        assert!(!cube.variables.contains_key("s2.b08"));
        let ndvi = &cube.variables["ndvi"];
        assert!((ndvi.get(0, 0, 0) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_derive_bands_applies_clip() {
        let mut cube = CubeDataset::new(vec![0.0], vec![0.0], vec![0]);
        cube.variables.insert("s2.x".into(), Array3::filled(1, 1, 1, 5.0));

        let bands = vec![band("clamped", "s2.x", Some((-1.0, 1.0)))];
        derive_bands(&mut cube, &bands).unwrap();

        assert_eq!(cube.variables["clamped"].get(0, 0, 0), 1.0);
    }

    #[test]
    fn test_derive_bands_rejects_unresolved_variable() {
        let mut cube = CubeDataset::new(vec![0.0], vec![0.0], vec![0]);
        let bands = vec![band("missing", "s2.b04", None)];
        assert!(derive_bands(&mut cube, &bands).is_err());
    }
}
