//! Raster Stager (C3) and Raster Format Registry (§6): opens a source
//! archive through the input storage contract, decodes the required
//! subbands, crops and reprojects them to the target CRS, and writes a
//! per-granule chunked store consumed by the Mosaic/Stack Orchestrator (C5).

pub mod archive;
pub mod decoder;
pub mod error;
pub mod manifest;
pub mod resample;
pub mod stager;
pub mod store;

pub use archive::{open_archive, ArchiveReader, TarArchiveReader, ZipArchiveReader};
pub use decoder::{
    decode_raw_band, GenericRasterDecoder, RasterDecoder, RasterFormatRegistry,
    Sentinel2RasterDecoder,
};
pub use error::StagingError;
pub use manifest::{resolve_variant, GranuleManifest, SubbandManifestEntry, SubbandVariant};
pub use stager::{stage, StageOutcome, StageRequest};
pub use store::{open_granule_store, write_granule_store};
