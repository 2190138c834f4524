//! Core configuration, error, and identifier types for the objsto provider.
//!
//! This crate holds the pieces shared by every resource adapter: the provider
//! configuration resolved once at startup (explicit values with environment
//! variable fallback), the shared error type, and the object identifier and
//! URL helpers used by the `objsto_object` resource.

mod config;
mod error;
mod types;

pub use config::{
    ENV_ACCESS_KEY, ENV_ENDPOINT, ENV_REGION, ENV_SECRET_KEY, ProviderConfig, ProviderSettings,
};
pub use error::{ObjstoError, ObjstoResult};
pub use types::{ObjectId, object_url};
