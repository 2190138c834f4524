//! Object storage client abstraction.
//!
//! ```text
//!   Resource ──▶ Arc<dyn StorageClient> ──┬──▶ S3StorageClient ──▶ aws-sdk-s3 ──▶ endpoint
//!                                         └──▶ InMemoryStorageClient (tests, dry runs)
//! ```
//!
//! Every call that targets something that does not exist fails with
//! [`StorageError::NotFound`], which resources use to drop vanished objects
//! from state.

mod error;
mod memory;
mod s3;
mod types;

use async_trait::async_trait;
use bytes::Bytes;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStorageClient;
pub use s3::S3StorageClient;
pub use types::{
    CorsRule, LifecycleAndOperator, LifecycleExpiration, LifecycleFilter, LifecycleRule,
    NoncurrentVersionExpiration, RuleStatus, StoredObject, Tag,
};

/// Operations the resources need from an S3-compatible service.
#[async_trait]
pub trait StorageClient: Send + Sync + 'static {
    /// Base endpoint URL, used to build object URLs.
    fn endpoint(&self) -> &str;

    // -- Buckets ------------------------------------------------------------

    /// `CreateBucket`.
    async fn create_bucket(&self, bucket: &str) -> StorageResult<()>;

    /// `HeadBucket`.
    async fn head_bucket(&self, bucket: &str) -> StorageResult<()>;

    /// `DeleteBucket`.
    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()>;

    // -- Policy -------------------------------------------------------------

    /// `PutBucketPolicy`.
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> StorageResult<()>;

    /// `GetBucketPolicy`, returning the raw document text.
    async fn get_bucket_policy(&self, bucket: &str) -> StorageResult<String>;

    /// `DeleteBucketPolicy`.
    async fn delete_bucket_policy(&self, bucket: &str) -> StorageResult<()>;

    // -- Lifecycle ----------------------------------------------------------

    /// `PutBucketLifecycleConfiguration`.
    async fn put_bucket_lifecycle(&self, bucket: &str, rules: &[LifecycleRule])
    -> StorageResult<()>;

    /// `GetBucketLifecycleConfiguration`.
    async fn get_bucket_lifecycle(&self, bucket: &str) -> StorageResult<Vec<LifecycleRule>>;

    /// `DeleteBucketLifecycle`.
    async fn delete_bucket_lifecycle(&self, bucket: &str) -> StorageResult<()>;

    // -- CORS ---------------------------------------------------------------

    /// `PutBucketCors`.
    async fn put_bucket_cors(&self, bucket: &str, rules: &[CorsRule]) -> StorageResult<()>;

    /// `GetBucketCors`.
    async fn get_bucket_cors(&self, bucket: &str) -> StorageResult<Vec<CorsRule>>;

    /// `DeleteBucketCors`.
    async fn delete_bucket_cors(&self, bucket: &str) -> StorageResult<()>;

    // -- Objects ------------------------------------------------------------

    /// `PutObject`.
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> StorageResult<()>;

    /// `GetObject`, reading the whole body.
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject>;

    /// `DeleteObject`.
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;
}
