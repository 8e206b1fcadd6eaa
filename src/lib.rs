//! MinIO/S3-compatible storage provider for admin file uploads
//!
//! [`ObjectStorageProvider`] streams uploaded temporary files into a bucket,
//! deletes stored objects, and resolves the URL a stored file is served
//! from: a presigned URL when links expire, a direct path-style URL when the
//! provider is configured with an expiry of 0 (public-read objects).
//!
//! ```no_run
//! use minio_upload_provider::{ObjectStorageProvider, ProviderConfig, StorageProvider, UploadedFile};
//!
//! # async fn run() -> minio_upload_provider::Result<()> {
//! let config = ProviderConfig::new("http://minio:9000", "files").with_expires(60);
//! let provider = ObjectStorageProvider::connect(config)?;
//!
//! provider.upload(&UploadedFile::new("/tmp/upload_123"), "a.png").await?;
//! let url = provider.path("a.png", "files").await?;
//! # let _ = url;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod features;
pub mod modules;
mod shared;

pub use crate::core::config::ProviderConfig;
pub use crate::core::error::{ClientError, Result, StorageError};
pub use crate::features::upload_file::{
    AccessPolicy, ObjectStorageProvider, ProviderBuilder, StorageProvider, UploadedFile,
};
pub use crate::modules::storage::{
    DeleteOutput, MinIOClient, ObjectAcl, ObjectStorageClient, UploadOutput, UploadRequest,
};
