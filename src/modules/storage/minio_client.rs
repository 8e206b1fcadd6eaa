//! MinIO/S3-compatible storage client
//!
//! Implements [`ObjectStorageClient`] on top of the rust-s3 crate:
//! streaming multipart uploads, object deletion and presigned GET URLs
//! for MinIO or any S3-compatible storage service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

use crate::core::config::ProviderConfig;
use crate::core::error::ClientError;
use crate::modules::storage::client::{
    DeleteOutput, ObjectStorageClient, UploadOutput, UploadRequest,
};

/// Initial buffer for a part when the body length is unknown (64KB)
const UNKNOWN_LENGTH_CAPACITY: usize = 64 * 1024;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    /// Handle for the configured default bucket
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    ///
    /// Missing credentials are resolved by rust-s3 from the environment,
    /// the shared AWS profile, or instance metadata. When none of those
    /// yields anything the client signs nothing, and the store's own
    /// rejection surfaces on the first request.
    pub fn new(config: &ProviderConfig) -> Result<Self, ClientError> {
        let credentials = resolve_credentials(config)?;

        let region = Region::Custom {
            region: config.region_name().to_string(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| ClientError::Setup(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}",
            config.endpoint,
            bucket.name()
        );

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Factory handed to the provider builder
    pub fn connect(config: &ProviderConfig) -> Result<Arc<dyn ObjectStorageClient>, ClientError> {
        Ok(Arc::new(Self::new(config)?))
    }

    /// Path-style handle for `name`, reusing the default bucket when it matches
    fn bucket_handle(&self, name: &str) -> Result<Box<Bucket>, ClientError> {
        if self.bucket.name() == name {
            return Ok(self.bucket.clone());
        }

        let mut bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())?;
        bucket.set_path_style();
        Ok(bucket)
    }

    fn location(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, key)
    }
}

#[async_trait]
impl ObjectStorageClient for MinIOClient {
    /// Upload a stream to the storage
    ///
    /// Bodies that fit in one part go out as a single PUT. Larger bodies use
    /// a multipart upload with at most `queue_size` parts in flight, so memory
    /// stays bounded by `part_size * (queue_size + 1)` whatever the file size.
    /// Parts already started keep uploading while the next part is read.
    /// Parts of a failed multipart upload are left to the bucket's lifecycle
    /// rules.
    async fn upload(&self, request: UploadRequest) -> Result<UploadOutput, ClientError> {
        let UploadRequest {
            bucket,
            key,
            mut body,
            content_length,
            content_type,
            part_size,
            queue_size,
            acl,
        } = request;

        let target = self.bucket_handle(&bucket)?;
        // The ACL header only belongs on the request that creates the object
        let mut creating = target.clone();
        if let Some(acl) = acl {
            creating.add_header("x-amz-acl", acl.as_header_value());
        }

        let mut remaining = content_length;
        let first = read_part(&mut body, part_size, remaining).await?;
        if first.len() < part_size {
            let response = creating
                .put_object_with_content_type(&key, &first, &content_type)
                .await?;
            debug!(
                "Uploaded file '{}' to bucket '{}' ({} bytes)",
                key,
                bucket,
                first.len()
            );
            return Ok(UploadOutput {
                location: self.location(&bucket, &key),
                etag: header_value(&response.headers(), "etag"),
                bucket,
                key,
            });
        }

        let upload_id = creating
            .initiate_multipart_upload(&key, &content_type)
            .await?
            .upload_id;
        debug!("Started multipart upload '{}' for '{}'", upload_id, key);

        let queue_size = queue_size.max(1);
        let mut in_flight = FuturesUnordered::new();
        let mut parts = Vec::new();
        let mut part_number: u32 = 0;
        let mut next = Some(first);

        while let Some(chunk) = next.take() {
            part_number += 1;
            let last = chunk.len() < part_size;
            remaining = remaining.map(|n| n.saturating_sub(chunk.len() as u64));
            in_flight.push(target.put_multipart_chunk(
                chunk,
                &key,
                part_number,
                &upload_id,
                &content_type,
            ));

            while in_flight.len() >= queue_size {
                if let Some(part) = in_flight.next().await {
                    parts.push(part?);
                }
            }

            if last {
                break;
            }

            // Keep started parts moving while the next one is read from disk
            let read = read_part(&mut body, part_size, remaining);
            tokio::pin!(read);
            let chunk = loop {
                tokio::select! {
                    chunk = &mut read => break chunk?,
                    Some(part) = in_flight.next(), if !in_flight.is_empty() => parts.push(part?),
                }
            };
            if !chunk.is_empty() {
                next = Some(chunk);
            }
        }

        while let Some(part) = in_flight.next().await {
            parts.push(part?);
        }
        drop(in_flight);
        parts.sort_by_key(|part| part.part_number);

        let response = target
            .complete_multipart_upload(&key, &upload_id, parts)
            .await?;
        debug!(
            "Uploaded file '{}' to bucket '{}' in {} parts",
            key, bucket, part_number
        );

        Ok(UploadOutput {
            location: self.location(&bucket, &key),
            etag: header_value(&response.headers(), "etag"),
            bucket,
            key,
        })
    }

    /// Delete a file from the storage
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteOutput, ClientError> {
        let response = self.bucket_handle(bucket)?.delete_object(key).await?;

        debug!("Deleted file '{}' from bucket '{}'", key, bucket);
        Ok(DeleteOutput {
            status_code: response.status_code(),
            version_id: header_value(&response.headers(), "x-amz-version-id"),
        })
    }

    /// Generate a presigned URL for downloading a file
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expiry_secs: u32,
    ) -> Result<String, ClientError> {
        let url = self
            .bucket_handle(bucket)?
            .presign_get(key, expiry_secs, None)
            .await?;

        Ok(url)
    }
}

/// Read up to `part_size` bytes, returning fewer only at end of stream
///
/// `remaining` is the number of body bytes still expected, when known; it
/// only sizes the buffer.
async fn read_part<R>(
    reader: &mut R,
    part_size: usize,
    remaining: Option<u64>,
) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let capacity = match remaining {
        Some(n) => part_size.min(usize::try_from(n).unwrap_or(usize::MAX)),
        None => part_size.min(UNKNOWN_LENGTH_CAPACITY),
    };
    let mut buf = Vec::with_capacity(capacity);
    (&mut *reader)
        .take(part_size as u64)
        .read_to_end(&mut buf)
        .await?;
    Ok(buf)
}

fn resolve_credentials(config: &ProviderConfig) -> Result<Credentials, ClientError> {
    let access_key = config.access_key_id.as_deref();
    let secret_key = config.secret_access_key.as_deref();

    let credentials = if access_key.is_none() && secret_key.is_none() {
        Credentials::new(None, None, None, None, None).or_else(|e| {
            warn!(
                "No ambient storage credentials found ({}), using anonymous access",
                e
            );
            Credentials::anonymous()
        })
    } else {
        Credentials::new(access_key, secret_key, None, None, None)
    };

    credentials
        .map_err(|e| ClientError::Setup(format!("Failed to create MinIO credentials: {}", e)))
}

fn header_value(headers: &HashMap<String, String>, name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.clone())
}
