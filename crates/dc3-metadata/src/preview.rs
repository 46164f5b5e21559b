//! Preview-channel election (§4.7): picks which band(s) the (external)
//! preview renderer should read, serialized under the `dc3:preview`
//! attribute key.

use dc3_common::{BuildRequest, RgbChannel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreviewChannels {
    Rgb {
        #[serde(rename = "RED")]
        red: String,
        #[serde(rename = "GREEN")]
        green: String,
        #[serde(rename = "BLUE")]
        blue: String,
    },
    Colormap(std::collections::HashMap<String, String>),
}

/// Elect the preview channel set: an exact RGB triple if the request
/// assigns exactly one band to each of Red/Green/Blue, else the first
/// colormap-bearing band, else a `"rainbow"` fallback over the first
/// declared band.
pub fn elect_preview(request: &BuildRequest) -> Option<PreviewChannels> {
    let rgb_bands = request.rgb_bands();
    if rgb_bands.len() == 3 {
        let red = rgb_bands
            .iter()
            .find(|b| b.rgb_channel == Some(RgbChannel::Red));
        let green = rgb_bands
            .iter()
            .find(|b| b.rgb_channel == Some(RgbChannel::Green));
        let blue = rgb_bands
            .iter()
            .find(|b| b.rgb_channel == Some(RgbChannel::Blue));
        if let (Some(r), Some(g), Some(b)) = (red, green, blue) {
            return Some(PreviewChannels::Rgb {
                red: r.name.clone(),
                green: g.name.clone(),
                blue: b.name.clone(),
            });
        }
    }

    if let Some(band) = request.bands.iter().find(|b| b.colormap.is_some()) {
        let mut map = std::collections::HashMap::new();
        map.insert(
            band.colormap.clone().expect("checked is_some above"),
            band.name.clone(),
        );
        return Some(PreviewChannels::Colormap(map));
    }

    request.bands.first().map(|band| {
        let mut map = std::collections::HashMap::new();
        map.insert("rainbow".to_string(), band.name.clone());
        PreviewChannels::Colormap(map)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc3_common::{ChunkingStrategy, Crs};

    fn request_with_bands(bands: Vec<dc3_common::BandDescriptor>) -> BuildRequest {
        BuildRequest {
            cube_id: "c1".into(),
            groups: vec![],
            bands,
            aliases: vec![],
            roi: "-1,-1,1,1".into(),
            roi_crs: Crs::wgs84(),
            target_resolution_m: 10.0,
            target_crs: Crs::wgs84(),
            chunking_strategy: ChunkingStrategy::Potato,
            description: None,
            package: false,
        }
    }

    fn rgb_band(name: &str, channel: RgbChannel) -> dc3_common::BandDescriptor {
        dc3_common::BandDescriptor {
            name: name.into(),
            expression: "s2.b04".into(),
            clip: None,
            rgb_channel: Some(channel),
            colormap: None,
            description: None,
            unit: None,
        }
    }

    #[test]
    fn test_elects_rgb_when_all_three_assigned() {
        let request = request_with_bands(vec![
            rgb_band("red_band", RgbChannel::Red),
            rgb_band("green_band", RgbChannel::Green),
            rgb_band("blue_band", RgbChannel::Blue),
        ]);
        match elect_preview(&request).unwrap() {
            PreviewChannels::Rgb { red, green, blue } => {
                assert_eq!(red, "red_band");
                assert_eq!(green, "green_band");
                assert_eq!(blue, "blue_band");
            }
            _ => panic!("expected RGB preview"),
        }
    }

    #[test]
    fn test_falls_back_to_colormap_band() {
        let mut band = rgb_band("ndvi", RgbChannel::Red);
        band.rgb_channel = None;
        band.colormap = Some("viridis".into());
        let request = request_with_bands(vec![band]);
        match elect_preview(&request).unwrap() {
            PreviewChannels::Colormap(map) => {
                assert_eq!(map.get("viridis").unwrap(), "ndvi");
            }
            _ => panic!("expected colormap preview"),
        }
    }

    #[test]
    fn test_falls_back_to_rainbow_over_first_band() {
        let mut band = rgb_band("ndvi", RgbChannel::Red);
        band.rgb_channel = None;
        let request = request_with_bands(vec![band]);
        match elect_preview(&request).unwrap() {
            PreviewChannels::Colormap(map) => {
                assert_eq!(map.get("rainbow").unwrap(), "ndvi");
            }
            _ => panic!("expected rainbow fallback"),
        }
    }

    #[test]
    fn test_partial_rgb_assignment_falls_through() {
        let request = request_with_bands(vec![
            rgb_band("red_band", RgbChannel::Red),
            rgb_band("green_band", RgbChannel::Green),
        ]);
        match elect_preview(&request).unwrap() {
            PreviewChannels::Colormap(map) => {
                assert_eq!(map.get("rainbow").unwrap(), "red_band");
            }
            _ => panic!("expected rainbow fallback when RGB assignment is incomplete"),
        }
    }
}
