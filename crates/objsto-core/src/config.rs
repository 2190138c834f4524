//! Provider configuration.
//!
//! Every setting may be given explicitly (provider configuration block, CLI
//! flag) or through an environment variable. [`ProviderSettings`] holds the
//! raw, possibly-missing values; [`ProviderSettings::resolve`] turns them into
//! a complete [`ProviderConfig`] once, at startup, and the resolved config is
//! then passed by reference to whatever builds the storage client.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::error::ObjstoError;

/// Environment variable for the S3 endpoint.
pub const ENV_ENDPOINT: &str = "OBJSTO_ENDPOINT";
/// Environment variable for the region.
pub const ENV_REGION: &str = "OBJSTO_REGION";
/// Environment variable for the access key.
pub const ENV_ACCESS_KEY: &str = "OBJSTO_ACCESS_KEY";
/// Environment variable for the secret key.
pub const ENV_SECRET_KEY: &str = "OBJSTO_SECRET_KEY";

/// Unresolved provider settings, as written in configuration.
///
/// `None` means "not configured"; such settings fall back to their
/// environment variable during [`resolve`](Self::resolve). An explicitly
/// configured value always wins, even when empty.
///
/// # Examples
///
/// ```
/// use objsto_core::ProviderSettings;
///
/// let settings = ProviderSettings::builder()
///     .endpoint(Some("http://localhost:9000".into()))
///     .region(Some("us-east-1".into()))
///     .access_key(Some("minio".into()))
///     .secret_key(Some("minio123".into()))
///     .build();
/// let config = settings.resolve_with(|_| None).unwrap();
/// assert_eq!(config.endpoint, "http://localhost:9000");
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct ProviderSettings {
    /// S3 endpoint of the object storage service.
    #[builder(default)]
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Region of the object storage service.
    #[builder(default)]
    #[serde(default)]
    pub region: Option<String>,
    /// Access key for the object storage service.
    #[builder(default)]
    #[serde(default)]
    pub access_key: Option<String>,
    /// Secret key for the object storage service.
    #[builder(default)]
    #[serde(default, skip_serializing)]
    pub secret_key: Option<String>,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ProviderSettings {
    /// Resolve the settings against the process environment.
    pub fn resolve(&self) -> Result<ProviderConfig, Vec<ObjstoError>> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve the settings using `lookup` for environment fallbacks.
    ///
    /// All missing settings are reported together rather than stopping at the
    /// first one. An environment variable that is set but empty counts as
    /// missing.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ProviderConfig, Vec<ObjstoError>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();
        let mut pick = |value: &Option<String>, attribute: &'static str, env: &'static str| {
            if let Some(v) = value {
                return v.clone();
            }
            match lookup(env) {
                Some(v) if !v.is_empty() => {
                    debug!(attribute, env, "provider setting taken from environment");
                    v
                }
                _ => {
                    errors.push(ObjstoError::MissingSetting { attribute, env });
                    String::new()
                }
            }
        };

        let endpoint = pick(&self.endpoint, "endpoint", ENV_ENDPOINT);
        let region = pick(&self.region, "region", ENV_REGION);
        let access_key = pick(&self.access_key, "access_key", ENV_ACCESS_KEY);
        let secret_key = pick(&self.secret_key, "secret_key", ENV_SECRET_KEY);

        if errors.is_empty() {
            Ok(ProviderConfig {
                endpoint,
                region,
                access_key,
                secret_key,
            })
        } else {
            Err(errors)
        }
    }
}

/// Fully resolved provider configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct ProviderConfig {
    /// S3 endpoint URL (e.g. `https://objects.example.com`).
    #[builder(setter(into))]
    pub endpoint: String,
    /// Signing region.
    #[builder(setter(into))]
    pub region: String,
    /// Static access key.
    #[builder(setter(into))]
    pub access_key: String,
    /// Static secret key. Never serialized.
    #[builder(setter(into))]
    #[serde(skip_serializing, default)]
    pub secret_key: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_should_prefer_explicit_values_over_environment() {
        let settings = ProviderSettings::builder()
            .endpoint(Some("http://explicit:9000".into()))
            .region(Some("eu-1".into()))
            .access_key(Some("ak".into()))
            .secret_key(Some("sk".into()))
            .build();
        let config = settings
            .resolve_with(env(&[(ENV_ENDPOINT, "http://env:9000")]))
            .unwrap();
        assert_eq!(config.endpoint, "http://explicit:9000");
        assert_eq!(config.region, "eu-1");
    }

    #[test]
    fn test_should_fall_back_to_environment() {
        let settings = ProviderSettings::default();
        let config = settings
            .resolve_with(env(&[
                (ENV_ENDPOINT, "http://env:9000"),
                (ENV_REGION, "fi-hel2"),
                (ENV_ACCESS_KEY, "ak"),
                (ENV_SECRET_KEY, "sk"),
            ]))
            .unwrap();
        assert_eq!(config.endpoint, "http://env:9000");
        assert_eq!(config.region, "fi-hel2");
        assert_eq!(config.access_key, "ak");
        assert_eq!(config.secret_key, "sk");
    }

    #[test]
    fn test_should_report_every_missing_setting() {
        let settings = ProviderSettings::builder()
            .region(Some("eu-1".into()))
            .build();
        let errors = settings
            .resolve_with(env(&[(ENV_ACCESS_KEY, "")]))
            .unwrap_err();
        assert_eq!(
            errors,
            vec![
                ObjstoError::MissingSetting {
                    attribute: "endpoint",
                    env: ENV_ENDPOINT
                },
                ObjstoError::MissingSetting {
                    attribute: "access_key",
                    env: ENV_ACCESS_KEY
                },
                ObjstoError::MissingSetting {
                    attribute: "secret_key",
                    env: ENV_SECRET_KEY
                },
            ]
        );
    }

    #[test]
    fn test_should_accept_explicit_empty_value() {
        let settings = ProviderSettings::builder()
            .endpoint(Some("http://x".into()))
            .region(Some(String::new()))
            .access_key(Some("ak".into()))
            .secret_key(Some("sk".into()))
            .build();
        let config = settings.resolve_with(|_| None).unwrap();
        assert_eq!(config.region, "");
    }

    #[test]
    fn test_should_redact_secret_in_debug_output() {
        let config = ProviderConfig::builder()
            .endpoint("http://x")
            .region("r")
            .access_key("ak")
            .secret_key("super-secret")
            .build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_should_not_serialize_secret_key() {
        let config = ProviderConfig::builder()
            .endpoint("http://x")
            .region("r")
            .access_key("ak")
            .secret_key("super-secret")
            .build();
        let json = serde_json::to_string(&config).expect("test serialization");
        assert!(json.contains("endpoint"));
        assert!(!json.contains("super-secret"));
    }
}
