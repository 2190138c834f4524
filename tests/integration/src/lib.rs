//! Integration tests for the objsto provider.
//!
//! These tests drive the resources against a live S3-compatible endpoint
//! (MinIO works) and check the side effects with a plain SDK client. They are
//! marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! OBJSTO_ENDPOINT=http://localhost:9000 OBJSTO_ACCESS_KEY=minioadmin \
//!   OBJSTO_SECRET_KEY=minioadmin cargo test -p objsto-integration -- --ignored
//! ```

use std::sync::{Arc, Once};

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use objsto_core::{ENV_ACCESS_KEY, ENV_ENDPOINT, ENV_REGION, ENV_SECRET_KEY, ProviderSettings};
use objsto_provider::{AnyResource, ConfiguredProvider, ObjstoProvider};
use serde_json::Value;
use tracing::warn;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Provider settings for the endpoint under test.
#[must_use]
pub fn settings() -> ProviderSettings {
    ProviderSettings::builder()
        .endpoint(Some(env_or(ENV_ENDPOINT, "http://localhost:9000")))
        .region(Some(env_or(ENV_REGION, "us-east-1")))
        .access_key(Some(env_or(ENV_ACCESS_KEY, "minioadmin")))
        .secret_key(Some(env_or(ENV_SECRET_KEY, "minioadmin")))
        .build()
}

/// A provider configured against the endpoint under test.
#[must_use]
pub fn provider() -> ConfiguredProvider {
    init_tracing();
    ObjstoProvider::new("integration")
        .configure(&settings())
        .unwrap_or_else(|diags| panic!("failed to configure provider: {diags}"))
}

/// Look up a resource of `provider` by type name.
#[must_use]
pub fn resource(provider: &ConfiguredProvider, type_name: &str) -> Arc<dyn AnyResource> {
    provider
        .resource(type_name)
        .unwrap_or_else(|| panic!("resource {type_name} is not registered"))
}

/// Create a resource and return its state, failing on any error diagnostic.
pub async fn create(resource: &dyn AnyResource, plan: Value) -> Value {
    let response = resource.create_json(plan).await;
    assert!(
        !response.has_error(),
        "create {} failed: {}",
        resource.type_name(),
        response.diagnostics
    );
    response.state.expect("create returned no state")
}

/// Create a configured S3 client pointing at the endpoint under test.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();
    let settings = settings();
    let creds = Credentials::new(
        settings.access_key.unwrap_or_default(),
        settings.secret_key.unwrap_or_default(),
        None,
        None,
        "integration-test",
    );

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(settings.region.unwrap_or_default()))
        .credentials_provider(creds)
        .endpoint_url(settings.endpoint.unwrap_or_default())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Delete all objects in a bucket, then delete the bucket.
pub async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    let Ok(resp) = client.list_objects_v2().bucket(bucket).send().await else {
        return; // Bucket may not exist.
    };
    for obj in resp.contents() {
        if let Some(key) = obj.key() {
            let _ = client.delete_object().bucket(bucket).key(key).send().await;
        }
    }
    if let Err(e) = client.delete_bucket().bucket(bucket).send().await {
        warn!(bucket, error = %e, "failed to clean up bucket");
    }
}

mod test_bucket;
mod test_cors;
mod test_lifecycle;
mod test_object;
mod test_policy;
