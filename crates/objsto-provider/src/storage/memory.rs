//! In-memory storage client.
//!
//! Follows the S3 error model closely enough for the resources to behave the
//! same as against a real endpoint: missing buckets, keys and configurations
//! are [`StorageError::NotFound`], conflicts are `409` service errors.
//!
//! Interior mutability uses `DashMap` for the bucket and object tables and
//! `parking_lot::RwLock` for single-valued bucket configuration.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use tracing::debug;

use super::{
    CorsRule, LifecycleRule, StorageClient, StorageError, StorageResult, StoredObject,
};

#[derive(Debug, Default)]
struct MemoryBucket {
    policy: RwLock<Option<String>>,
    lifecycle: RwLock<Option<Vec<LifecycleRule>>>,
    cors: RwLock<Option<Vec<CorsRule>>>,
    objects: DashMap<String, Bytes>,
}

/// A [`StorageClient`] keeping everything in process memory.
///
/// # Examples
///
/// ```
/// use objsto_provider::storage::{InMemoryStorageClient, StorageClient};
///
/// # tokio_test::block_on(async {
/// let client = InMemoryStorageClient::new("http://localhost:9000");
/// client.create_bucket("assets").await.unwrap();
/// assert!(client.head_bucket("assets").await.is_ok());
/// assert!(client.head_bucket("missing").await.unwrap_err().is_not_found());
/// # });
/// ```
#[derive(Debug)]
pub struct InMemoryStorageClient {
    endpoint: String,
    buckets: DashMap<String, Arc<MemoryBucket>>,
}

impl InMemoryStorageClient {
    /// Create an empty store that reports `endpoint` as its base URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            buckets: DashMap::new(),
        }
    }

    fn bucket(&self, operation: &'static str, bucket: &str) -> StorageResult<Arc<MemoryBucket>> {
        self.buckets
            .get(bucket)
            .map(|b| Arc::clone(b.value()))
            .ok_or_else(|| {
                StorageError::not_found(
                    operation,
                    format!("The specified bucket does not exist: {bucket}"),
                )
            })
    }
}

fn conflict(operation: &'static str, code: &str, message: String) -> StorageError {
    StorageError::Service {
        operation,
        status: Some(409),
        code: Some(code.to_owned()),
        message,
    }
}

fn bad_request(operation: &'static str, code: &str, message: String) -> StorageError {
    StorageError::Service {
        operation,
        status: Some(400),
        code: Some(code.to_owned()),
        message,
    }
}

#[async_trait]
impl StorageClient for InMemoryStorageClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        const OP: &str = "create bucket";
        match self.buckets.entry(bucket.to_owned()) {
            Entry::Occupied(_) => Err(conflict(
                OP,
                "BucketAlreadyOwnedByYou",
                format!("Bucket already exists: {bucket}"),
            )),
            Entry::Vacant(slot) => {
                slot.insert(Arc::default());
                debug!(bucket, "create_bucket completed");
                Ok(())
            }
        }
    }

    async fn head_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.bucket("read bucket", bucket).map(|_| ())
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        const OP: &str = "delete bucket";
        let existing = self.bucket(OP, bucket)?;
        if !existing.objects.is_empty() {
            return Err(conflict(
                OP,
                "BucketNotEmpty",
                format!("The bucket you tried to delete is not empty: {bucket}"),
            ));
        }
        self.buckets.remove(bucket);
        debug!(bucket, "delete_bucket completed");
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> StorageResult<()> {
        const OP: &str = "create bucket policy";
        let existing = self.bucket(OP, bucket)?;
        if let Err(e) = serde_json::from_str::<serde_json::Value>(policy) {
            return Err(bad_request(
                OP,
                "MalformedPolicy",
                format!("Policies must be valid JSON: {e}"),
            ));
        }
        *existing.policy.write() = Some(policy.to_owned());
        debug!(bucket, "put_bucket_policy completed");
        Ok(())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> StorageResult<String> {
        const OP: &str = "read bucket policy";
        let existing = self.bucket(OP, bucket)?;
        let policy = existing.policy.read().clone();
        policy.ok_or_else(|| StorageError::not_found(OP, "The bucket policy does not exist"))
    }

    async fn delete_bucket_policy(&self, bucket: &str) -> StorageResult<()> {
        let existing = self.bucket("delete bucket policy", bucket)?;
        *existing.policy.write() = None;
        debug!(bucket, "delete_bucket_policy completed");
        Ok(())
    }

    async fn put_bucket_lifecycle(
        &self,
        bucket: &str,
        rules: &[LifecycleRule],
    ) -> StorageResult<()> {
        const OP: &str = "create bucket lifecycle configuration";
        let existing = self.bucket(OP, bucket)?;
        if rules.is_empty() {
            return Err(bad_request(
                OP,
                "MalformedXML",
                "A lifecycle configuration needs at least one rule".to_owned(),
            ));
        }
        *existing.lifecycle.write() = Some(rules.to_vec());
        debug!(bucket, rules = rules.len(), "put_bucket_lifecycle_configuration completed");
        Ok(())
    }

    async fn get_bucket_lifecycle(&self, bucket: &str) -> StorageResult<Vec<LifecycleRule>> {
        const OP: &str = "read bucket lifecycle configuration";
        let existing = self.bucket(OP, bucket)?;
        let rules = existing.lifecycle.read().clone();
        rules.ok_or_else(|| {
            StorageError::not_found(OP, "The lifecycle configuration does not exist")
        })
    }

    async fn delete_bucket_lifecycle(&self, bucket: &str) -> StorageResult<()> {
        let existing = self.bucket("delete bucket lifecycle", bucket)?;
        *existing.lifecycle.write() = None;
        debug!(bucket, "delete_bucket_lifecycle completed");
        Ok(())
    }

    async fn put_bucket_cors(&self, bucket: &str, rules: &[CorsRule]) -> StorageResult<()> {
        const OP: &str = "create bucket CORS configuration";
        let existing = self.bucket(OP, bucket)?;
        if rules.is_empty() {
            return Err(bad_request(
                OP,
                "MalformedXML",
                "A CORS configuration needs at least one rule".to_owned(),
            ));
        }
        *existing.cors.write() = Some(rules.to_vec());
        debug!(bucket, rules = rules.len(), "put_bucket_cors completed");
        Ok(())
    }

    async fn get_bucket_cors(&self, bucket: &str) -> StorageResult<Vec<CorsRule>> {
        const OP: &str = "read bucket CORS configuration";
        let existing = self.bucket(OP, bucket)?;
        let rules = existing.cors.read().clone();
        rules.ok_or_else(|| StorageError::not_found(OP, "The CORS configuration does not exist"))
    }

    async fn delete_bucket_cors(&self, bucket: &str) -> StorageResult<()> {
        let existing = self.bucket("delete bucket CORS configuration", bucket)?;
        *existing.cors.write() = None;
        debug!(bucket, "delete_bucket_cors completed");
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> StorageResult<()> {
        let existing = self.bucket("create object", bucket)?;
        let len = body.len();
        existing.objects.insert(key.to_owned(), body);
        debug!(bucket, key, len, "put_object completed");
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        const OP: &str = "read object";
        let existing = self.bucket(OP, bucket)?;
        let body = existing
            .objects
            .get(key)
            .map(|b| b.value().clone())
            .ok_or_else(|| {
                StorageError::not_found(OP, format!("The specified key does not exist: {key}"))
            })?;
        let content_length = i64::try_from(body.len()).ok();
        Ok(StoredObject {
            body,
            content_length,
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let existing = self.bucket("delete object", bucket)?;
        existing.objects.remove(key);
        debug!(bucket, key, "delete_object completed");
        Ok(())
    }
}
