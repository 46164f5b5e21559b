//! Per-band variable descriptors (§4.7 "Variables").

use dc3_common::{BandDescriptor, CubeDataset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub name: String,
    pub dimensions: [&'static str; 3],
    pub description: Option<String>,
    pub unit: Option<String>,
    pub expression: String,
    /// `None` when the variable is entirely `NaN` (no valid cell to derive
    /// an extent from).
    pub extent: Option<(f64, f64)>,
}

/// Build a descriptor for every declared band present in the cube (the
/// expression evaluator has already restricted the cube to exactly the
/// declared band names by the time C7 runs).
pub fn variable_descriptors(cube: &CubeDataset, bands: &[BandDescriptor]) -> Vec<VariableDescriptor> {
    bands
        .iter()
        .map(|band| VariableDescriptor {
            name: band.name.clone(),
            dimensions: ["x", "y", "t"],
            description: band.description.clone(),
            unit: band.unit.clone(),
            expression: band.expression.clone(),
            extent: cube
                .variables
                .get(&band.name)
                .and_then(|arr| arr.min_max_ignoring_nan()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc3_common::Array3;

    fn toy_band(name: &str) -> BandDescriptor {
        BandDescriptor {
            name: name.to_string(),
            expression: "s2.b04".to_string(),
            clip: None,
            rgb_channel: None,
            colormap: None,
            description: Some("toy band".to_string()),
            unit: None,
        }
    }

    #[test]
    fn test_extent_computed_from_cube_array() {
        let mut cube = CubeDataset::new(vec![0.0, 1.0], vec![0.0], vec![0]);
        let mut arr = Array3::filled(2, 1, 1, f64::NAN);
        arr.set(0, 0, 0, 5.0);
        arr.set(1, 0, 0, 9.0);
        cube.variables.insert("ndvi".into(), arr);

        let descriptors = variable_descriptors(&cube, &[toy_band("ndvi")]);
        assert_eq!(descriptors[0].extent, Some((5.0, 9.0)));
    }

    #[test]
    fn test_extent_none_for_missing_variable() {
        let cube = CubeDataset::new(vec![0.0], vec![0.0], vec![0]);
        let descriptors = variable_descriptors(&cube, &[toy_band("missing")]);
        assert_eq!(descriptors[0].extent, None);
    }
}
