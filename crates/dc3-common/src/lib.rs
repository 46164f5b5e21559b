//! Common types shared across all dc3 datacube-builder crates.

pub mod bbox;
pub mod context;
pub mod crs;
pub mod cube;
pub mod error;
pub mod model;
pub mod storage;

pub use bbox::BoundingBox;
pub use context::{BuildConfig, BuildContext, CacheHandle};
pub use crs::{Crs, CrsParseError};
pub use cube::{Array3, CubeDataset};
pub use error::{BuildError, BuildResult};
pub use model::{
    AliasedProductType, BandDescriptor, BuildRequest, CachedRasterRecord, ChunkingStrategy,
    ProductType, RasterFile, RasterGroup, RgbChannel,
};
pub use storage::{validate_input_uri, ArchiveByteReader, InputScheme, InputStorage};
