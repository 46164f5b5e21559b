//! The Raster Format Registry (§6): `product_type → decoder implementation`.
//!
//! Every decoder shares the same generic manifest + raw-binary-band shape
//! (see `crate::manifest`); what differs per product type is whether it
//! needs the Sentinel-2 negative-value masking rule (§4.3 step 8, §12) and
//! which manifest entry name it looks for inside the archive.

use std::collections::HashMap;

use dc3_algebra::Grid2D;
use dc3_common::model::ProductType;

use crate::error::StagingError;

/// Per-product-type decoding behavior. All decoders share the same binary
/// band layout (`crate::decoder::decode_raw_band`); this trait only carries
/// the handful of things that legitimately vary per sensor family.
pub trait RasterDecoder: Send + Sync {
    /// The archive entry name holding the acquisition manifest.
    fn manifest_entry(&self) -> &str {
        "manifest.xml"
    }

    /// Sentinel-2 L2A-SAFE products use negative reflectance values as a
    /// sensor no-data sentinel (§4.3 step 8); every other registered source
    /// defaults to false.
    fn masks_negative_as_nodata(&self) -> bool {
        false
    }
}

/// Decodes a raw little-endian `f32` band payload into a [`Grid2D`].
///
/// Storage layout is row-major, row 0 = northernmost row (standard raster
/// convention) — per §4.3 step 6 ("transpose then y-flip so that (x, y, t)
/// indexing matches ascending coordinates"), rows are reversed here so grid
/// row 0 corresponds to the smallest (southernmost) y, matching an ascending
/// y-coordinate array. [`Grid2D`]'s own (row, col) layout already matches
/// (y, x) indexing, so no transpose is needed beyond this reversal.
pub fn decode_raw_band(raw: &[u8], width: usize, height: usize) -> Result<Grid2D, StagingError> {
    let expected_bytes = width * height * 4;
    if raw.len() != expected_bytes {
        return Err(StagingError::BadPixelCount {
            expected: width * height,
            got: raw.len() / 4,
        });
    }

    let mut data = vec![0.0_f64; width * height];
    for row in 0..height {
        let flipped_row = height - 1 - row;
        for col in 0..width {
            let offset = (row * width + col) * 4;
            let bytes: [u8; 4] = raw[offset..offset + 4].try_into().unwrap();
            data[flipped_row * width + col] = f32::from_le_bytes(bytes) as f64;
        }
    }
    Ok(Grid2D::from_rows(width, height, data))
}

pub struct GenericRasterDecoder;

impl RasterDecoder for GenericRasterDecoder {}

pub struct Sentinel2RasterDecoder;

impl RasterDecoder for Sentinel2RasterDecoder {
    fn masks_negative_as_nodata(&self) -> bool {
        true
    }
}

/// `product_type → decoder` mapping. The request's `aliases` must cover
/// every referenced product type (validated by the orchestrator before
/// staging begins), otherwise BadRequest.
#[derive(Default)]
pub struct RasterFormatRegistry {
    decoders: HashMap<ProductType, Box<dyn RasterDecoder>>,
}

impl RasterFormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the known sensor families; callers may
    /// still `register` additional product types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            ProductType::new("sentinel2", "l2a-safe"),
            Box::new(Sentinel2RasterDecoder),
        );
        registry
    }

    pub fn register(&mut self, product_type: ProductType, decoder: Box<dyn RasterDecoder>) {
        self.decoders.insert(product_type, decoder);
    }

    /// Resolve a decoder for `product_type`, falling back to the generic
    /// decoder for any source not given bespoke masking rules.
    pub fn resolve(&self, product_type: &ProductType) -> Box<dyn RasterDecoder> {
        if let Some(decoder) = self.decoders.get(product_type) {
            return dyn_clone_decoder(decoder.as_ref());
        }
        Box::new(GenericRasterDecoder)
    }
}

/// [`RasterDecoder`] implementations are zero-sized marker types; rather than
/// pull in `dyn-clone` for one call site, reconstruct the known variants
/// directly.
fn dyn_clone_decoder(decoder: &dyn RasterDecoder) -> Box<dyn RasterDecoder> {
    if decoder.masks_negative_as_nodata() {
        Box::new(Sentinel2RasterDecoder)
    } else {
        Box::new(GenericRasterDecoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_raw_band_flips_rows() {
        // 2x2, row-major, row0=[1,2] (north), row1=[3,4] (south).
        let mut raw = Vec::new();
        for v in [1.0_f32, 2.0, 3.0, 4.0] {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let grid = decode_raw_band(&raw, 2, 2).unwrap();
        // row0 of the grid (ascending y, south) should be the file's row1.
        assert_eq!(grid.get(0, 0), 3.0);
        assert_eq!(grid.get(0, 1), 4.0);
        assert_eq!(grid.get(1, 0), 1.0);
        assert_eq!(grid.get(1, 1), 2.0);
    }

    #[test]
    fn test_registry_resolves_sentinel2_masking() {
        let registry = RasterFormatRegistry::with_defaults();
        let decoder = registry.resolve(&ProductType::new("sentinel2", "l2a-safe"));
        assert!(decoder.masks_negative_as_nodata());

        let decoder = registry.resolve(&ProductType::new("landsat8", "collection2"));
        assert!(!decoder.masks_negative_as_nodata());
    }
}
