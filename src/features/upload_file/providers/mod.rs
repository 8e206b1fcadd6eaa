mod base_provider;
mod minio_provider;

pub use base_provider::StorageProvider;
pub use minio_provider::{AccessPolicy, ObjectStorageProvider, ProviderBuilder};
