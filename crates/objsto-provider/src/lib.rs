//! Declarative resources for S3-compatible object storage.
//!
//! Each managed object type (bucket, bucket policy, lifecycle configuration,
//! CORS configuration, object) is a [`Resource`] that translates between a
//! serde data model and calls on a [`StorageClient`]. An orchestrator, or the
//! `objsto` CLI, drives them through the type-erased [`AnyResource`] view of a
//! [`ConfiguredProvider`].
//!
//! # Architecture
//!
//! ```text
//! orchestrator / CLI
//!        |
//!        v
//!   ConfiguredProvider (registry by type name)
//!        |
//!        v
//!   Resource adapters ──▶ objsto-policy (policy normalization)
//!        |
//!        v
//!   StorageClient (aws-sdk-s3 | in-memory)
//! ```

pub mod diagnostics;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod storage;
pub mod validation;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use provider::{ConfiguredProvider, ObjstoProvider, ProviderMetadata, RESOURCE_TYPES};
pub use resource::{AnyResource, Resource, Response};
pub use schema::Schema;
pub use storage::{InMemoryStorageClient, S3StorageClient, StorageClient, StorageError};
