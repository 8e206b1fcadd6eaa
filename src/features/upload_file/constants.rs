/// Default lifetime of signed links, in minutes (24h)
pub const DAY_IN_MINUTES: u32 = 24 * 60;

/// Longest lifetime a SigV4 presigned URL may have, in minutes (7 days)
pub const MAX_EXPIRES_MINUTES: u32 = 7 * DAY_IN_MINUTES;

/// Size of each multipart upload part (5MB)
pub const UPLOAD_PART_SIZE: usize = 5 * 1024 * 1024;

/// Maximum number of parts uploaded concurrently
pub const UPLOAD_QUEUE_SIZE: usize = 10;

/// Content type used when the uploaded file does not report one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Default SigV4 region for S3-compatible stores
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// ERROR MESSAGES
// =============================================================================

/// Reported when no object storage client could be set up
pub const NO_STORAGE_CLIENT: &str = "object storage client library not installed";
