//! The storage collaborator named in §6: local filesystem and
//! S3/MinIO-compatible input, plus an async output-side uploader for the
//! finished cube store and distribution archive.
//!
//! Grounded on `crates/storage/src/object_store.rs`'s `ObjectStorage`
//! client shape and `crates/ingestion/src/upload.rs`'s directory-upload
//! helper.

pub mod config;
pub mod error;
pub mod input;
pub mod output;

pub use config::ObjectStoreConfig;
pub use error::StorageError;
pub use input::{LocalFilesystemInputStorage, S3InputStorage};
pub use output::OutputStore;
