//! The input storage contract (§6): an abstraction the Raster Stager (C3)
//! opens source archives through, kept here (rather than in
//! `dc3-object-store`) so that both `dc3-object-store` (the concrete
//! implementation) and `dc3-staging` (the consumer) can depend on the trait
//! without depending on each other.

use std::io::Read;

use crate::error::BuildError;

/// A streamed byte reader over an opened input archive. Boxed so storage
/// backends can return a local `File`, an in-memory cursor over a
/// fully-buffered S3 GetObject response, or any other `Read` source.
pub type ArchiveByteReader = Box<dyn Read + Send>;

/// Supported input URI schemes (§6: "local filesystem and a cloud blob
/// scheme, pluggable").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputScheme {
    /// A relative path, resolved against the storage's configured root.
    Relative,
    /// `s3://bucket/key` (or any other registered blob scheme).
    Blob,
}

/// Storage collaborator contract. Implementations must be `Send + Sync`: the
/// orchestrator shares one handle across the worker pool (§5).
pub trait InputStorage: Send + Sync {
    /// Open `uri` as a streamed byte reader. `uri` has already passed
    /// [`validate_input_uri`]; implementations still validate against their
    /// own root/bucket configuration.
    fn open(&self, uri: &str) -> Result<ArchiveByteReader, BuildError>;
}

/// Validates an input URI against the §6 contract before it ever reaches a
/// storage backend:
/// - paths containing `/../` are rejected (escapes the configured root),
/// - `file://` scheme is rejected for input,
/// - a rooted absolute path (e.g. `/etc/passwd`) is rejected for input.
///
/// Returns the classified [`InputScheme`] on success.
pub fn validate_input_uri(uri: &str) -> Result<InputScheme, BuildError> {
    if uri.contains("/../") || uri.ends_with("/..") {
        return Err(BuildError::bad_request(format!(
            "input uri escapes configured root: {uri}"
        )));
    }

    if uri.starts_with("file://") {
        return Err(BuildError::bad_request(format!(
            "file:// scheme is rejected for input: {uri}"
        )));
    }

    if let Some(idx) = uri.find("://") {
        let scheme = &uri[..idx];
        if scheme.eq_ignore_ascii_case("file") {
            return Err(BuildError::bad_request(format!(
                "file:// scheme is rejected for input: {uri}"
            )));
        }
        return Ok(InputScheme::Blob);
    }

    if uri.starts_with('/') {
        return Err(BuildError::bad_request(format!(
            "rooted absolute path is rejected for input: {uri}"
        )));
    }

    Ok(InputScheme::Relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_parent_traversal() {
        assert!(validate_input_uri("granules/../../../etc/passwd").is_err());
    }

    #[test]
    fn test_rejects_file_scheme() {
        assert!(validate_input_uri("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_rejects_rooted_absolute_path() {
        assert!(validate_input_uri("/var/data/granule.zip").is_err());
    }

    #[test]
    fn test_accepts_relative_path() {
        assert_eq!(
            validate_input_uri("sentinel2/granule.zip").unwrap(),
            InputScheme::Relative
        );
    }

    #[test]
    fn test_accepts_blob_scheme() {
        assert_eq!(
            validate_input_uri("s3://bucket/granule.zip").unwrap(),
            InputScheme::Blob
        );
    }
}
