use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::upload_file::dtos::UploadedFile;
use crate::modules::storage::{DeleteOutput, UploadOutput};

/// Operations every upload storage backend offers to the upload feature
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Bucket new uploads are written to
    fn bucket(&self) -> &str;

    /// Store `file` under `key` in [`StorageProvider::bucket`]
    async fn upload(&self, file: &UploadedFile, key: &str) -> Result<UploadOutput>;

    async fn delete(&self, key: &str, bucket: &str) -> Result<DeleteOutput>;

    /// URL the stored file can be fetched from
    async fn path(&self, key: &str, bucket: &str) -> Result<String>;
}
