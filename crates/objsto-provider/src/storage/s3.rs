//! [`StorageClient`] backed by `aws-sdk-s3`.
//!
//! The client is built once from a resolved [`ProviderConfig`]: static
//! credentials, the configured region and endpoint, and path-style
//! addressing (most S3-compatible services do not serve virtual-hosted
//! buckets). Transport, signing and retries are left to the SDK.
//!
//! SDK errors are classified by HTTP status: `404` becomes
//! [`StorageError::NotFound`], everything else [`StorageError::Service`] with
//! the service error code when one was returned.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, DateTime as SmithyDateTime};
use aws_sdk_s3::types as s3;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use objsto_core::ProviderConfig;
use tracing::debug;

use super::{
    CorsRule, LifecycleAndOperator, LifecycleExpiration, LifecycleFilter, LifecycleRule,
    NoncurrentVersionExpiration, RuleStatus, StorageClient, StorageError, StorageResult,
    StoredObject, Tag,
};

/// Name reported as the credentials provider.
const CREDENTIALS_SOURCE: &str = "objsto-provider";

/// A [`StorageClient`] talking to a real S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3StorageClient {
    client: aws_sdk_s3::Client,
    endpoint: String,
}

impl S3StorageClient {
    /// Build a client from a resolved provider configuration.
    #[must_use]
    pub fn new(config: &ProviderConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            CREDENTIALS_SOURCE,
        );
        let sdk_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .force_path_style(true)
            .build();
        debug!(endpoint = %config.endpoint, region = %config.region, "s3 client configured");
        Self {
            client: aws_sdk_s3::Client::from_conf(sdk_config),
            endpoint: config.endpoint.clone(),
        }
    }
}

/// A successful `GetBucketPolicy` must carry a document.
fn policy_document(operation: &'static str, policy: Option<&str>) -> StorageResult<String> {
    policy
        .map(str::to_owned)
        .ok_or_else(|| StorageError::service(operation, "response carried no policy document"))
}

/// Map an SDK failure onto [`StorageError`].
fn classify<E>(operation: &'static str, err: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.code().map(str::to_owned);
    let message = err
        .message()
        .map_or_else(|| DisplayErrorContext(&err).to_string(), str::to_owned);
    debug!(operation, ?status, ?code, %message, "storage call failed");

    if status == Some(404) {
        return StorageError::NotFound { operation, message };
    }
    StorageError::Service {
        operation,
        status,
        code,
        message,
    }
}

fn build_error(operation: &'static str, err: impl std::fmt::Display) -> StorageError {
    StorageError::invalid_request(operation, err.to_string())
}

// ---------------------------------------------------------------------------
// Conversions to SDK types
// ---------------------------------------------------------------------------

fn to_sdk_date(date: DateTime<Utc>) -> SmithyDateTime {
    SmithyDateTime::from_secs_and_nanos(date.timestamp(), date.timestamp_subsec_nanos())
}

fn from_sdk_date(date: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(date.secs(), date.subsec_nanos())
}

fn to_sdk_tag(operation: &'static str, tag: &Tag) -> StorageResult<s3::Tag> {
    s3::Tag::builder()
        .key(&tag.key)
        .value(&tag.value)
        .build()
        .map_err(|e| build_error(operation, e))
}

fn to_sdk_filter(
    operation: &'static str,
    filter: &LifecycleFilter,
) -> StorageResult<s3::LifecycleRuleFilter> {
    let tag = filter
        .tag
        .as_ref()
        .map(|t| to_sdk_tag(operation, t))
        .transpose()?;
    let and = match &filter.and {
        Some(and) => {
            let tags = and
                .tags
                .iter()
                .map(|t| to_sdk_tag(operation, t))
                .collect::<StorageResult<Vec<_>>>()?;
            Some(
                s3::LifecycleRuleAndOperator::builder()
                    .set_prefix(and.prefix.clone())
                    .set_object_size_greater_than(and.object_size_greater_than)
                    .set_object_size_less_than(and.object_size_less_than)
                    .set_tags(Some(tags))
                    .build(),
            )
        }
        None => None,
    };
    Ok(s3::LifecycleRuleFilter::builder()
        .set_prefix(filter.prefix.clone())
        .set_object_size_greater_than(filter.object_size_greater_than)
        .set_object_size_less_than(filter.object_size_less_than)
        .set_tag(tag)
        .set_and(and)
        .build())
}

fn to_sdk_rule(operation: &'static str, rule: &LifecycleRule) -> StorageResult<s3::LifecycleRule> {
    let status = match rule.status {
        RuleStatus::Enabled => s3::ExpirationStatus::Enabled,
        RuleStatus::Disabled => s3::ExpirationStatus::Disabled,
    };
    let filter = rule
        .filter
        .as_ref()
        .map(|f| to_sdk_filter(operation, f))
        .transpose()?;
    let expiration = rule.expiration.as_ref().map(|e| {
        s3::LifecycleExpiration::builder()
            .set_date(e.date.map(to_sdk_date))
            .set_days(e.days)
            .build()
    });
    let noncurrent = rule.noncurrent_version_expiration.as_ref().map(|n| {
        s3::NoncurrentVersionExpiration::builder()
            .set_newer_noncurrent_versions(n.newer_noncurrent_versions)
            .set_noncurrent_days(n.noncurrent_days)
            .build()
    });
    s3::LifecycleRule::builder()
        .set_id(rule.id.clone())
        .status(status)
        .set_filter(filter)
        .set_expiration(expiration)
        .set_noncurrent_version_expiration(noncurrent)
        .build()
        .map_err(|e| build_error(operation, e))
}

fn to_sdk_cors_rule(operation: &'static str, rule: &CorsRule) -> StorageResult<s3::CorsRule> {
    s3::CorsRule::builder()
        .set_id(rule.id.clone())
        .set_allowed_headers(non_empty(&rule.allowed_headers))
        .set_allowed_methods(Some(rule.allowed_methods.clone()))
        .set_allowed_origins(Some(rule.allowed_origins.clone()))
        .set_expose_headers(non_empty(&rule.expose_headers))
        .set_max_age_seconds(rule.max_age_seconds)
        .build()
        .map_err(|e| build_error(operation, e))
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

// ---------------------------------------------------------------------------
// Conversions from SDK types
// ---------------------------------------------------------------------------

fn from_sdk_tag(tag: &s3::Tag) -> Tag {
    Tag {
        key: tag.key().to_owned(),
        value: tag.value().to_owned(),
    }
}

fn from_sdk_rule(rule: &s3::LifecycleRule) -> LifecycleRule {
    let status = match rule.status() {
        s3::ExpirationStatus::Disabled => RuleStatus::Disabled,
        _ => RuleStatus::Enabled,
    };
    let filter = rule.filter().map(|f| LifecycleFilter {
        object_size_greater_than: f.object_size_greater_than(),
        object_size_less_than: f.object_size_less_than(),
        prefix: f.prefix().map(str::to_owned),
        tag: f.tag().map(from_sdk_tag),
        and: f.and().map(|a| LifecycleAndOperator {
            object_size_greater_than: a.object_size_greater_than(),
            object_size_less_than: a.object_size_less_than(),
            prefix: a.prefix().map(str::to_owned),
            tags: a.tags().iter().map(from_sdk_tag).collect(),
        }),
    });
    LifecycleRule {
        id: rule.id().map(str::to_owned),
        status,
        filter,
        expiration: rule.expiration().map(|e| LifecycleExpiration {
            date: e.date().and_then(from_sdk_date),
            days: e.days(),
        }),
        noncurrent_version_expiration: rule.noncurrent_version_expiration().map(|n| {
            NoncurrentVersionExpiration {
                newer_noncurrent_versions: n.newer_noncurrent_versions(),
                noncurrent_days: n.noncurrent_days(),
            }
        }),
    }
}

fn from_sdk_cors_rule(rule: &s3::CorsRule) -> CorsRule {
    CorsRule {
        id: rule.id().map(str::to_owned),
        allowed_headers: rule.allowed_headers().to_vec(),
        allowed_methods: rule.allowed_methods().to_vec(),
        allowed_origins: rule.allowed_origins().to_vec(),
        expose_headers: rule.expose_headers().to_vec(),
        max_age_seconds: rule.max_age_seconds(),
    }
}

#[async_trait]
impl StorageClient for S3StorageClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify("create bucket", e))?;
        debug!(bucket, "create_bucket completed");
        Ok(())
    }

    async fn head_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify("read bucket", e))?;
        debug!(bucket, "head_bucket completed");
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify("delete bucket", e))?;
        debug!(bucket, "delete_bucket completed");
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> StorageResult<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| classify("create bucket policy", e))?;
        debug!(bucket, "put_bucket_policy completed");
        Ok(())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> StorageResult<String> {
        const OP: &str = "read bucket policy";
        let output = self
            .client
            .get_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        debug!(bucket, "get_bucket_policy completed");
        policy_document(OP, output.policy())
    }

    async fn delete_bucket_policy(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .delete_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify("delete bucket policy", e))?;
        debug!(bucket, "delete_bucket_policy completed");
        Ok(())
    }

    async fn put_bucket_lifecycle(
        &self,
        bucket: &str,
        rules: &[LifecycleRule],
    ) -> StorageResult<()> {
        const OP: &str = "create bucket lifecycle configuration";
        let rules = rules
            .iter()
            .map(|r| to_sdk_rule(OP, r))
            .collect::<StorageResult<Vec<_>>>()?;
        let configuration = s3::BucketLifecycleConfiguration::builder()
            .set_rules(Some(rules))
            .build()
            .map_err(|e| build_error(OP, e))?;
        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(bucket)
            .lifecycle_configuration(configuration)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        debug!(bucket, "put_bucket_lifecycle_configuration completed");
        Ok(())
    }

    async fn get_bucket_lifecycle(&self, bucket: &str) -> StorageResult<Vec<LifecycleRule>> {
        let output = self
            .client
            .get_bucket_lifecycle_configuration()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify("read bucket lifecycle configuration", e))?;
        debug!(bucket, "get_bucket_lifecycle_configuration completed");
        Ok(output.rules().iter().map(from_sdk_rule).collect())
    }

    async fn delete_bucket_lifecycle(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .delete_bucket_lifecycle()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify("delete bucket lifecycle", e))?;
        debug!(bucket, "delete_bucket_lifecycle completed");
        Ok(())
    }

    async fn put_bucket_cors(&self, bucket: &str, rules: &[CorsRule]) -> StorageResult<()> {
        const OP: &str = "create bucket CORS configuration";
        let rules = rules
            .iter()
            .map(|r| to_sdk_cors_rule(OP, r))
            .collect::<StorageResult<Vec<_>>>()?;
        let configuration = s3::CorsConfiguration::builder()
            .set_cors_rules(Some(rules))
            .build()
            .map_err(|e| build_error(OP, e))?;
        self.client
            .put_bucket_cors()
            .bucket(bucket)
            .cors_configuration(configuration)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        debug!(bucket, "put_bucket_cors completed");
        Ok(())
    }

    async fn get_bucket_cors(&self, bucket: &str) -> StorageResult<Vec<CorsRule>> {
        let output = self
            .client
            .get_bucket_cors()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify("read bucket CORS configuration", e))?;
        debug!(bucket, "get_bucket_cors completed");
        Ok(output.cors_rules().iter().map(from_sdk_cors_rule).collect())
    }

    async fn delete_bucket_cors(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .delete_bucket_cors()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify("delete bucket CORS configuration", e))?;
        debug!(bucket, "delete_bucket_cors completed");
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> StorageResult<()> {
        let len = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| classify("create object", e))?;
        debug!(bucket, key, len, "put_object completed");
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        const OP: &str = "read object";
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        let content_length = output.content_length();
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::service(OP, format!("failed to read object body: {e}")))?
            .into_bytes();
        debug!(bucket, key, len = body.len(), "get_object completed");
        Ok(StoredObject {
            body,
            content_length,
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify("delete object", e))?;
        debug!(bucket, key, "delete_object completed");
        Ok(())
    }
}
