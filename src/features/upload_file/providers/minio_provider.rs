use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::File;
use tracing::{debug, info, warn};

use crate::core::config::ProviderConfig;
use crate::core::error::{ClientError, Result, StorageError};
use crate::features::upload_file::constants::{UPLOAD_PART_SIZE, UPLOAD_QUEUE_SIZE};
use crate::features::upload_file::dtos::UploadedFile;
use crate::features::upload_file::providers::StorageProvider;
use crate::modules::storage::{
    DeleteOutput, MinIOClient, ObjectAcl, ObjectStorageClient, UploadOutput, UploadRequest,
};

/// How stored files are exposed, derived from the configured expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Objects are uploaded public-read and linked directly
    Public,
    /// Objects stay private and are linked through presigned URLs
    Signed { expires_minutes: u32 },
}

impl AccessPolicy {
    /// An expiry of 0 disables signing altogether; it never means a
    /// zero-length signature.
    pub fn from_expires(minutes: u32) -> Self {
        if minutes == 0 {
            AccessPolicy::Public
        } else {
            AccessPolicy::Signed {
                expires_minutes: minutes,
            }
        }
    }

    pub fn acl(&self) -> Option<ObjectAcl> {
        match self {
            AccessPolicy::Public => Some(ObjectAcl::PublicRead),
            AccessPolicy::Signed { .. } => None,
        }
    }
}

type ClientFactory =
    Box<dyn FnOnce(&ProviderConfig) -> std::result::Result<Arc<dyn ObjectStorageClient>, ClientError> + Send>;

/// Builds an [`ObjectStorageProvider`] from a config and a storage client
///
/// The client is either supplied ready-made or produced by a factory. A
/// builder with neither, or a failing factory, yields
/// [`StorageError::DependencyUnavailable`].
pub struct ProviderBuilder {
    config: ProviderConfig,
    client: Option<Arc<dyn ObjectStorageClient>>,
    factory: Option<ClientFactory>,
}

impl ProviderBuilder {
    pub fn client(mut self, client: Arc<dyn ObjectStorageClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&ProviderConfig) -> std::result::Result<Arc<dyn ObjectStorageClient>, ClientError>
            + Send
            + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    pub fn build(self) -> Result<ObjectStorageProvider> {
        let config = self.config.validated()?;

        let client = match (self.client, self.factory) {
            (Some(client), _) => client,
            (None, Some(factory)) => factory(&config).map_err(|e| {
                warn!("Object storage client setup failed: {}", e);
                StorageError::DependencyUnavailable
            })?,
            (None, None) => {
                warn!("No object storage client or factory was supplied");
                return Err(StorageError::DependencyUnavailable);
            }
        };

        let expires = config.effective_expires();
        let policy = AccessPolicy::from_expires(expires);

        info!(
            "Object storage provider ready: endpoint={}, bucket={}, policy={:?}",
            config.endpoint, config.bucket, policy
        );

        Ok(ObjectStorageProvider {
            client,
            bucket: config.bucket,
            endpoint: config.endpoint,
            expires,
            policy,
        })
    }
}

/// Upload provider storing files in a MinIO/S3-compatible bucket
pub struct ObjectStorageProvider {
    client: Arc<dyn ObjectStorageClient>,
    bucket: String,
    endpoint: String,
    expires: u32,
    policy: AccessPolicy,
}

impl fmt::Debug for ObjectStorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStorageProvider")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("expires", &self.expires)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ObjectStorageProvider {
    pub fn builder(config: ProviderConfig) -> ProviderBuilder {
        ProviderBuilder {
            config,
            client: None,
            factory: None,
        }
    }

    /// Create a provider backed by the rust-s3 MinIO client
    pub fn connect(config: ProviderConfig) -> Result<Self> {
        Self::builder(config).factory(MinIOClient::connect).build()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Signed link lifetime in minutes, 0 for public files
    pub fn expires(&self) -> u32 {
        self.expires
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }
}

#[async_trait]
impl StorageProvider for ObjectStorageProvider {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Stream the temporary file to the configured bucket
    ///
    /// Public policy uploads the object with the `public-read` ACL; signed
    /// policy leaves the bucket default in place.
    async fn upload(&self, file: &UploadedFile, key: &str) -> Result<UploadOutput> {
        if key.is_empty() {
            return Err(StorageError::Validation(
                "destination key must not be empty".to_string(),
            ));
        }

        let body = File::open(file.path())
            .await
            .map_err(|e| StorageError::UploadFailed(ClientError::Io(e)))?;
        let content_length = body.metadata().await.ok().map(|m| m.len());

        let request = UploadRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            body: Box::new(body),
            content_length,
            content_type: file.content_type_or_default().to_string(),
            part_size: UPLOAD_PART_SIZE,
            queue_size: UPLOAD_QUEUE_SIZE,
            acl: self.policy.acl(),
        };

        let output = self
            .client
            .upload(request)
            .await
            .map_err(StorageError::UploadFailed)?;

        debug!(
            "Uploaded '{}' as '{}' to bucket '{}'",
            file.path().display(),
            key,
            self.bucket
        );
        Ok(output)
    }

    async fn delete(&self, key: &str, bucket: &str) -> Result<DeleteOutput> {
        let output = self
            .client
            .delete_object(bucket, key)
            .await
            .map_err(StorageError::DeleteFailed)?;

        debug!("Deleted '{}' from bucket '{}'", key, bucket);
        Ok(output)
    }

    /// Presigned URL under signed policy, `{endpoint}/{bucket}/{key}` otherwise
    ///
    /// Nothing is cached: every call signs a new URL.
    async fn path(&self, key: &str, bucket: &str) -> Result<String> {
        match self.policy {
            AccessPolicy::Signed { expires_minutes } => self
                .client
                .presign_get(bucket, key, expires_minutes * 60)
                .await
                .map_err(StorageError::SignFailed),
            AccessPolicy::Public => Ok(format!("{}/{}/{}", self.endpoint, bucket, key)),
        }
    }
}
