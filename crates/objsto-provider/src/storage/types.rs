//! Request and response types shared by every storage client.
//!
//! These mirror the S3 wire shapes closely but stay independent of any SDK so
//! that the resources can be exercised against [`InMemoryStorageClient`]
//! (see [`super::memory`]) as well as a real endpoint.
//!
//! [`InMemoryStorageClient`]: super::InMemoryStorageClient

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Whether a lifecycle rule is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleStatus {
    /// The rule is applied.
    #[default]
    Enabled,
    /// The rule is kept but not applied.
    Disabled,
}

impl RuleStatus {
    /// The wire value (`Enabled` / `Disabled`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
        }
    }
}

/// A single lifecycle rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleRule {
    /// Rule identifier.
    pub id: Option<String>,
    /// Rule status.
    pub status: RuleStatus,
    /// Objects the rule applies to.
    pub filter: Option<LifecycleFilter>,
    /// When current versions expire.
    pub expiration: Option<LifecycleExpiration>,
    /// When noncurrent versions expire.
    pub noncurrent_version_expiration: Option<NoncurrentVersionExpiration>,
}

/// Object selector of a lifecycle rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleFilter {
    /// Minimum object size in bytes.
    pub object_size_greater_than: Option<i64>,
    /// Maximum object size in bytes.
    pub object_size_less_than: Option<i64>,
    /// Key prefix.
    pub prefix: Option<String>,
    /// Single tag.
    pub tag: Option<Tag>,
    /// Conjunction of several predicates.
    pub and: Option<LifecycleAndOperator>,
}

/// Conjunction of lifecycle filter predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleAndOperator {
    /// Minimum object size in bytes.
    pub object_size_greater_than: Option<i64>,
    /// Maximum object size in bytes.
    pub object_size_less_than: Option<i64>,
    /// Key prefix.
    pub prefix: Option<String>,
    /// Tags that must all match.
    pub tags: Vec<Tag>,
}

/// An object tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// Expiration of current object versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleExpiration {
    /// Absolute expiration date.
    pub date: Option<DateTime<Utc>>,
    /// Days after creation.
    pub days: Option<i32>,
}

/// Expiration of noncurrent object versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoncurrentVersionExpiration {
    /// Number of newer noncurrent versions to keep.
    pub newer_noncurrent_versions: Option<i32>,
    /// Days after a version becomes noncurrent.
    pub noncurrent_days: Option<i32>,
}

// ---------------------------------------------------------------------------
// CORS
// ---------------------------------------------------------------------------

/// A single CORS rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsRule {
    /// Rule identifier.
    pub id: Option<String>,
    /// Request headers allowed in preflight requests.
    pub allowed_headers: Vec<String>,
    /// HTTP methods allowed.
    pub allowed_methods: Vec<String>,
    /// Origins allowed.
    pub allowed_origins: Vec<String>,
    /// Response headers exposed to the browser.
    pub expose_headers: Vec<String>,
    /// Preflight cache duration.
    pub max_age_seconds: Option<i32>,
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// An object body as returned by `GetObject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// The full body.
    pub body: Bytes,
    /// The `Content-Length` the service reported, if any.
    pub content_length: Option<i64>,
}
