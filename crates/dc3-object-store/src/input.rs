//! `InputStorage` implementations for the two schemes §6 requires: local
//! filesystem and an S3/MinIO-compatible blob store. The object-store
//! backend bridges `object_store`'s async API to the synchronous
//! `InputStorage` contract with a dedicated Tokio runtime, since the
//! worker pool that calls `open()` (§9's redesign) is plain `std::thread`,
//! not async.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use dc3_common::storage::{validate_input_uri, ArchiveByteReader, InputScheme};
use dc3_common::{BuildError, InputStorage};
use object_store::aws::AmazonS3Builder;
use object_store::{path::Path as ObjectPath, ObjectStore};

use crate::config::ObjectStoreConfig;
use crate::error::StorageError;

/// Resolves relative input URIs against a configured root directory.
pub struct LocalFilesystemInputStorage {
    root: PathBuf,
}

impl LocalFilesystemInputStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl InputStorage for LocalFilesystemInputStorage {
    fn open(&self, uri: &str) -> Result<ArchiveByteReader, BuildError> {
        let scheme = validate_input_uri(uri)?;
        if scheme != InputScheme::Relative {
            return Err(BuildError::bad_request(format!(
                "local filesystem storage only accepts relative paths, got: {uri}"
            )));
        }
        let path = self.root.join(uri);
        let file = File::open(&path).map_err(|e| {
            BuildError::download(uri.to_string(), format!("{}: {e}", path.display()))
        })?;
        Ok(Box::new(file))
    }
}

/// S3/MinIO-compatible `InputStorage`, bridging `object_store`'s async
/// `GetObject` onto the sync trait boundary via a private runtime.
pub struct S3InputStorage {
    store: Arc<dyn ObjectStore>,
    runtime: tokio::runtime::Runtime,
}

impl S3InputStorage {
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region);

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ClientSetup(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| StorageError::ClientSetup(e.to_string()))?;

        Ok(Self {
            store: Arc::new(store),
            runtime,
        })
    }
}

impl InputStorage for S3InputStorage {
    fn open(&self, uri: &str) -> Result<ArchiveByteReader, BuildError> {
        validate_input_uri(uri)?;
        let location = ObjectPath::from(uri);
        let store = self.store.clone();

        let bytes = self
            .runtime
            .block_on(async move {
                let result = store.get(&location).await?;
                result.bytes().await
            })
            .map_err(|e| BuildError::download(uri.to_string(), e.to_string()))?;

        Ok(Box::new(std::io::Cursor::new(bytes.to_vec())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_local_storage_reads_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("granule.zip"), b"hello").unwrap();

        let storage = LocalFilesystemInputStorage::new(dir.path());
        let mut reader = storage.open("granule.zip").unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn test_local_storage_rejects_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFilesystemInputStorage::new(dir.path());
        assert!(storage.open("/etc/passwd").is_err());
    }

    #[test]
    fn test_local_storage_rejects_blob_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFilesystemInputStorage::new(dir.path());
        assert!(storage.open("s3://bucket/key").is_err());
    }

    #[test]
    fn test_local_storage_missing_file_is_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFilesystemInputStorage::new(dir.path());
        match storage.open("missing.zip") {
            Err(BuildError::DownloadError { .. }) => {}
            other => panic!("expected DownloadError, got {other:?}"),
        }
    }
}
