//! Provider entry point.
//!
//! ```text
//!   ProviderSettings ── configure ──▶ ProviderConfig ──▶ S3StorageClient
//!                                                           │
//!                    ConfiguredProvider { objsto_bucket, objsto_bucket_policy, ... }
//! ```
//!
//! Configuration is resolved once. Every resource of a configured provider
//! shares the same storage client.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use objsto_core::{ENV_ACCESS_KEY, ENV_ENDPOINT, ENV_REGION, ENV_SECRET_KEY, ProviderSettings};
use serde::Serialize;
use tracing::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::resource::{AnyResource, Resource};
use crate::resources::{
    BucketCorsConfigurationResource, BucketLifecycleConfigurationResource, BucketPolicyResource,
    BucketResource, ObjectResource,
};
use crate::schema::{Attribute, Schema};
use crate::storage::{S3StorageClient, StorageClient};

/// Provider name and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    /// Prefix of every resource type name.
    pub type_name: &'static str,
    /// Provider release.
    pub version: String,
}

/// The `objsto` provider before configuration.
#[derive(Debug, Clone)]
pub struct ObjstoProvider {
    version: String,
}

fn setting(description: &str, env: &str) -> Attribute {
    Attribute::string(format!(
        "{description}. Can also be configured with `{env}` environment variable."
    ))
}

impl ObjstoProvider {
    /// Provider type name.
    pub const TYPE_NAME: &'static str = "objsto";

    /// Create a provider reporting `version`.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Name and version.
    #[must_use]
    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: Self::TYPE_NAME,
            version: self.version.clone(),
        }
    }

    /// Provider configuration schema.
    #[must_use]
    pub fn schema(&self) -> Schema {
        Schema::new(
            "The `objsto` provider is used to manage S3 compatible object storage services such as [UpCloud Managed Object Storage](https://upcloud.com/products/object-storage).",
        )
        .attribute(
            "endpoint",
            setting("S3 endpoint of the object storage service", ENV_ENDPOINT),
        )
        .attribute(
            "region",
            setting("Region of the object storage service", ENV_REGION),
        )
        .attribute(
            "access_key",
            setting("Access key for the object storage service", ENV_ACCESS_KEY),
        )
        .attribute(
            "secret_key",
            setting("Secret key for the object storage service", ENV_SECRET_KEY).sensitive(),
        )
    }

    /// Resolve `settings` and build an S3 client for every resource.
    ///
    /// # Errors
    ///
    /// Returns one diagnostic per setting missing from both the configuration
    /// and the environment.
    pub fn configure(&self, settings: &ProviderSettings) -> Result<ConfiguredProvider, Diagnostics> {
        let config = settings.resolve().map_err(Diagnostics::from)?;
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            version = %self.version,
            "configured objsto provider"
        );
        Ok(ConfiguredProvider::new(Arc::new(S3StorageClient::new(&config))))
    }
}

/// A provider with a storage client, ready to serve resources.
pub struct ConfiguredProvider {
    client: Arc<dyn StorageClient>,
    resources: BTreeMap<&'static str, Arc<dyn AnyResource>>,
}

impl fmt::Debug for ConfiguredProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredProvider")
            .field("endpoint", &self.client.endpoint())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ConfiguredProvider {
    /// Register every resource on top of `client`.
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        let resources: [Arc<dyn AnyResource>; 5] = [
            Arc::new(BucketResource::new(client.clone())),
            Arc::new(BucketPolicyResource::new(client.clone())),
            Arc::new(BucketLifecycleConfigurationResource::new(client.clone())),
            Arc::new(BucketCorsConfigurationResource::new(client.clone())),
            Arc::new(ObjectResource::new(client.clone())),
        ];
        let resources: BTreeMap<_, _> = resources
            .into_iter()
            .map(|resource| (resource.type_name(), resource))
            .collect();
        debug!(count = resources.len(), "registered resources");
        Self { client, resources }
    }

    /// The shared storage client.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn StorageClient> {
        &self.client
    }

    /// Look up a resource by full type name.
    #[must_use]
    pub fn resource(&self, type_name: &str) -> Option<Arc<dyn AnyResource>> {
        self.resources.get(type_name).cloned()
    }

    /// Registered type names, sorted.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }
}

/// Full type names of every resource the provider serves.
pub const RESOURCE_TYPES: [&str; 5] = [
    BucketResource::TYPE_NAME,
    BucketCorsConfigurationResource::TYPE_NAME,
    BucketLifecycleConfigurationResource::TYPE_NAME,
    BucketPolicyResource::TYPE_NAME,
    ObjectResource::TYPE_NAME,
];
