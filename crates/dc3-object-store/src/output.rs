//! Output-side collaborator: uploads the finished chunked store (or the
//! packaged distribution archive) to the destination object store.
//! Grounded directly on the teacher's `upload_zarr_directory` helper, kept
//! async since the Cube Writer (C8) is the one component that talks to the
//! destination over the network and isn't on the C3/C5 worker-pool hot path.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::{path::Path as ObjectPath, ObjectStore};
use tracing::{debug, instrument};

use crate::config::ObjectStoreConfig;
use crate::error::StorageError;

pub struct OutputStore {
    store: Arc<dyn ObjectStore>,
}

impl OutputStore {
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

        Ok(Self {
            store: Arc::new(store),
        })
    }

    /// Upload a single file to `destination_path`.
    #[instrument(skip(self), fields(path = %destination_path))]
    pub async fn upload_file(&self, local_path: &Path, destination_path: &str) -> Result<u64, StorageError> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|e| StorageError::WriteFailed {
                path: destination_path.to_string(),
                detail: e.to_string(),
            })?;
        let size = data.len() as u64;

        self.store
            .put(&ObjectPath::from(destination_path), Bytes::from(data).into())
            .await
            .map_err(|e| StorageError::WriteFailed {
                path: destination_path.to_string(),
                detail: e.to_string(),
            })?;

        debug!(size, "uploaded file");
        Ok(size)
    }

    /// Recursively upload every file under `local_dir` to `destination_prefix`,
    /// preserving relative paths (the chunked store's directory-per-variable
    /// layout, §6).
    #[instrument(skip(self), fields(prefix = %destination_prefix))]
    pub async fn upload_directory(
        &self,
        local_dir: &Path,
        destination_prefix: &str,
    ) -> Result<u64, StorageError> {
        let mut total = 0u64;

        for entry in walkdir::WalkDir::new(local_dir) {
            let entry = entry.map_err(|e| StorageError::WalkFailed {
                path: local_dir.display().to_string(),
                detail: e.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(local_dir).map_err(|e| StorageError::WalkFailed {
                path: local_dir.display().to_string(),
                detail: e.to_string(),
            })?;
            let destination_path = format!("{destination_prefix}/{}", relative.display());

            total += self.upload_file(entry.path(), &destination_path).await?;
        }

        Ok(total)
    }
}
