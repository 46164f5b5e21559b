//! Connection configuration for the S3/MinIO-compatible input & output
//! storage collaborator (§6), mirroring the teacher's
//! `ObjectStorageConfig` idiom.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub allow_http: bool,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            bucket: "dc3-datacubes".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

impl ObjectStoreConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("DC3_S3_ENDPOINT") {
            config.endpoint = v;
        }
        if let Ok(v) = std::env::var("DC3_S3_BUCKET") {
            config.bucket = v;
        }
        if let Ok(v) = std::env::var("DC3_S3_ACCESS_KEY_ID") {
            config.access_key_id = v;
        }
        if let Ok(v) = std::env::var("DC3_S3_SECRET_ACCESS_KEY") {
            config.secret_access_key = v;
        }
        if let Ok(v) = std::env::var("DC3_S3_REGION") {
            config.region = v;
        }
        if let Ok(v) = std::env::var("DC3_S3_ALLOW_HTTP") {
            config.allow_http = v.eq_ignore_ascii_case("true") || v == "1";
        }
        config
    }
}
