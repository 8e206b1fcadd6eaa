use std::env;

use serde::Deserialize;
use validator::Validate;

use crate::core::error::{Result, StorageError};
use crate::features::upload_file::constants::{DAY_IN_MINUTES, DEFAULT_REGION};

/// Options for the MinIO/S3 upload provider
///
/// Field names deserialize in camelCase (`accessKeyId`, `secretAccessKey`)
/// so the options can come straight from a JSON settings blob.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// MinIO/S3 endpoint URL, also the base of public file URLs
    #[validate(url(message = "endpoint must be a valid URL"))]
    pub endpoint: String,
    /// Access key; when absent the client tries AWS_ACCESS_KEY_ID and the
    /// shared profile, then sends anonymous requests
    pub access_key_id: Option<String>,
    /// Secret key; resolved like `access_key_id` when absent
    pub secret_access_key: Option<String>,
    /// Bucket where uploaded files are stored
    #[validate(length(min = 1, message = "bucket is required"))]
    pub bucket: String,
    /// How long signed links stay valid, in minutes. Defaults to 24h.
    /// 0 marks uploaded files as public-read and disables signing.
    #[validate(range(max = 10080, message = "expires cannot exceed 7 days (10080 minutes)"))]
    pub expires: Option<u32>,
    /// AWS region used for request signing
    pub region: Option<String>,
}

impl ProviderConfig {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key_id: None,
            secret_access_key: None,
            bucket: bucket.into(),
            expires: None,
            region: None,
        }
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_expires(mut self, minutes: u32) -> Self {
        self.expires = Some(minutes);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Load configuration from `MINIO_*` environment variables
    pub fn from_env() -> std::result::Result<Self, String> {
        // Load .env file if exists, ignore if not found
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Error loading .env file: {}", e);
            }
        }

        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars<F>(var: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = var("MINIO_ENDPOINT")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "MINIO_ENDPOINT environment variable is required".to_string())?;

        let bucket = var("MINIO_BUCKET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "MINIO_BUCKET environment variable is required".to_string())?;

        // Only use credentials if they are non-empty
        let access_key_id = var("MINIO_ACCESS_KEY").filter(|s| !s.is_empty());
        let secret_access_key = var("MINIO_SECRET_KEY").filter(|s| !s.is_empty());

        let expires = var("MINIO_EXPIRES")
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.trim()
                    .parse::<u32>()
                    .map_err(|_| "MINIO_EXPIRES must be a valid number of minutes".to_string())
            })
            .transpose()?;

        let region = var("MINIO_REGION").filter(|s| !s.is_empty());

        Ok(Self {
            endpoint,
            access_key_id,
            secret_access_key,
            bucket,
            expires,
            region,
        })
    }

    /// Check field constraints, reporting every violation at once
    pub fn validated(self) -> Result<Self> {
        self.validate()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;
        Ok(self)
    }

    /// Signed link lifetime in minutes, after applying the 24h default
    pub fn effective_expires(&self) -> u32 {
        self.expires.unwrap_or(DAY_IN_MINUTES)
    }

    pub fn region_name(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}
