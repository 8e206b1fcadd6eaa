//! Storage module for object storage access
//!
//! Defines the client contract the upload provider relies on and its
//! MinIO/S3-compatible implementation.

pub mod client;
mod minio_client;

pub use client::{
    DeleteOutput, ObjectAcl, ObjectStorageClient, UploadBody, UploadOutput, UploadRequest,
};
pub use minio_client::MinIOClient;
