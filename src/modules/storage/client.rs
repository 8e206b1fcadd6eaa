//! Object storage client contract
//!
//! The provider talks to the store only through [`ObjectStorageClient`], so
//! any S3-protocol client (or a test double) can be plugged in.

use std::fmt;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::core::error::ClientError;

/// Streaming request body, read part by part
pub type UploadBody = Box<dyn AsyncRead + Send + Unpin>;

/// Canned ACL applied to an uploaded object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAcl {
    PublicRead,
}

impl ObjectAcl {
    pub fn as_header_value(&self) -> &'static str {
        match self {
            ObjectAcl::PublicRead => "public-read",
        }
    }
}

/// Parameters of a single managed upload
pub struct UploadRequest {
    pub bucket: String,
    pub key: String,
    pub body: UploadBody,
    /// Body length in bytes, when known up front
    pub content_length: Option<u64>,
    pub content_type: String,
    /// Bytes per multipart part
    pub part_size: usize,
    /// Maximum number of parts in flight
    pub queue_size: usize,
    /// `None` leaves the bucket default (private)
    pub acl: Option<ObjectAcl>,
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .field("part_size", &self.part_size)
            .field("queue_size", &self.queue_size)
            .field("acl", &self.acl)
            .finish_non_exhaustive()
    }
}

/// Confirmation of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutput {
    pub location: String,
    pub bucket: String,
    pub key: String,
    pub etag: Option<String>,
}

/// Store response to a delete-object call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutput {
    pub status_code: u16,
    pub version_id: Option<String>,
}

#[async_trait]
pub trait ObjectStorageClient: Send + Sync {
    /// Stream `request.body` into `request.bucket`/`request.key`
    async fn upload(&self, request: UploadRequest) -> Result<UploadOutput, ClientError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteOutput, ClientError>;

    /// Presigned GET URL valid for `expiry_secs` seconds from now
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expiry_secs: u32,
    ) -> Result<String, ClientError>;
}
