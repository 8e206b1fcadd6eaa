//! Upload file feature - storage providers backing admin file uploads

pub mod constants;
pub mod dtos;
pub mod providers;

pub use dtos::UploadedFile;
pub use providers::{AccessPolicy, ObjectStorageProvider, ProviderBuilder, StorageProvider};
