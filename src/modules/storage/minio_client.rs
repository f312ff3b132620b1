//! MinIO/S3-compatible storage client
//!
//! Holds the raw bytes of accident photos. Metadata lives in the `files`
//! table; this client only knows object keys.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    pub fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
        })
    }

    /// Create the bucket when it is missing
    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => {
                info!("Bucket '{}' created on {}", self.bucket.name(), self.endpoint);
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    pub async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), AppError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload '{}': {}", key, e)))?;
        ensure_success("upload", key, response.status_code())?;

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    pub async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to download '{}': {}", key, e)))?;
        ensure_success("download", key, response.status_code())?;

        Ok(response.to_vec())
    }

    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete '{}': {}", key, e)))?;
        ensure_success("delete", key, response.status_code())?;

        debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

/// Non-2xx responses come back as `Ok` without the `fail-on-err` feature
fn ensure_success(operation: &str, key: &str, status: u16) -> Result<(), AppError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(AppError::Storage(format!(
            "Failed to {} '{}': HTTP {}",
            operation, key, status
        )))
    }
}
