//! `objsto_bucket_cors_configuration` resource.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diagnostics::Diagnostics;
use crate::resource::{Resource, Response};
use crate::schema::{Attribute, Block, Schema};
use crate::storage::{CorsRule, StorageClient};
use crate::validation;

/// State of a bucket CORS configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfigurationModel {
    /// Bucket the configuration belongs to.
    pub bucket: String,
    /// CORS rules; empty only right after import.
    #[serde(default)]
    pub cors_rule: Vec<CorsRuleModel>,
}

/// One CORS rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsRuleModel {
    /// HTTP methods allowed.
    pub allowed_methods: BTreeSet<String>,
    /// Origins allowed.
    pub allowed_origins: BTreeSet<String>,
    /// Request headers allowed in preflight requests.
    pub allowed_headers: Option<BTreeSet<String>>,
    /// Response headers exposed to the browser.
    pub expose_headers: Option<BTreeSet<String>>,
    /// Rule identifier.
    pub id: Option<String>,
    /// Preflight cache duration.
    pub max_age_seconds: Option<i32>,
}

impl From<&CorsRuleModel> for CorsRule {
    fn from(rule: &CorsRuleModel) -> Self {
        Self {
            id: rule.id.clone(),
            allowed_headers: rule.allowed_headers.iter().flatten().cloned().collect(),
            allowed_methods: rule.allowed_methods.iter().cloned().collect(),
            allowed_origins: rule.allowed_origins.iter().cloned().collect(),
            expose_headers: rule.expose_headers.iter().flatten().cloned().collect(),
            max_age_seconds: rule.max_age_seconds,
        }
    }
}

impl From<CorsRule> for CorsRuleModel {
    fn from(rule: CorsRule) -> Self {
        fn optional_set(values: Vec<String>) -> Option<BTreeSet<String>> {
            (!values.is_empty()).then(|| values.into_iter().collect())
        }
        Self {
            allowed_methods: rule.allowed_methods.into_iter().collect(),
            allowed_origins: rule.allowed_origins.into_iter().collect(),
            allowed_headers: optional_set(rule.allowed_headers),
            expose_headers: optional_set(rule.expose_headers),
            id: rule.id,
            max_age_seconds: rule.max_age_seconds,
        }
    }
}

/// Manages the CORS configuration of a bucket.
pub struct BucketCorsConfigurationResource {
    client: Arc<dyn StorageClient>,
}

impl fmt::Debug for BucketCorsConfigurationResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketCorsConfigurationResource")
            .field("endpoint", &self.client.endpoint())
            .finish()
    }
}

impl BucketCorsConfigurationResource {
    /// Create the resource on top of `client`.
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        Self { client }
    }

    async fn put(&self, plan: CorsConfigurationModel) -> Response<CorsConfigurationModel> {
        let rules: Vec<CorsRule> = plan.cors_rule.iter().map(CorsRule::from).collect();
        if let Err(e) = self.client.put_bucket_cors(&plan.bucket, &rules).await {
            let mut diags = Diagnostics::new();
            diags.add_error("Unable to create bucket CORS configuration", e.to_string());
            return Response::failed(diags);
        }
        debug!(bucket = %plan.bucket, rules = rules.len(), "put bucket cors completed");
        Response::ok(plan)
    }
}

#[async_trait]
impl Resource for BucketCorsConfigurationResource {
    type Model = CorsConfigurationModel;

    const TYPE_NAME: &'static str = "objsto_bucket_cors_configuration";

    fn schema(&self) -> Schema {
        let rule = Block::list("A CORS rule to apply to the bucket.")
            .min_items(1)
            .attribute(
                "allowed_methods",
                Attribute::string_set("The allowed HTTP methods for this rule.").required(),
            )
            .attribute(
                "allowed_origins",
                Attribute::string_set("The allowed origins for this rule.").required(),
            )
            .attribute(
                "allowed_headers",
                Attribute::string_set(
                    "The headers to include in `Access-Control-Request-Headers` header.",
                ),
            )
            .attribute(
                "expose_headers",
                Attribute::string_set(
                    "The headers to include in the `Access-Control-Expose-Headers` header.",
                ),
            )
            .attribute("id", Attribute::string("The identifier of the rule."))
            .attribute(
                "max_age_seconds",
                Attribute::int32("The cache time in seconds."),
            );
        Schema::new(
            "A bucket CORS configuration resource. Note that there can only be one CORS configuration per bucket.",
        )
        .attribute(
            "bucket",
            Attribute::string("The name of the bucket for which to configure the CORS.")
                .required()
                .requires_replace(),
        )
        .block("cors_rule", rule)
    }

    fn validate(&self, model: &CorsConfigurationModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validation::not_empty(&mut diags, "bucket", &model.bucket);
        validation::size_at_least(&mut diags, "cors_rule", model.cors_rule.len(), 1);
        for (i, rule) in model.cors_rule.iter().enumerate() {
            validation::size_at_least(
                &mut diags,
                &format!("cors_rule[{i}].allowed_methods"),
                rule.allowed_methods.len(),
                1,
            );
            validation::size_at_least(
                &mut diags,
                &format!("cors_rule[{i}].allowed_origins"),
                rule.allowed_origins.len(),
                1,
            );
        }
        diags
    }

    async fn create(&self, plan: CorsConfigurationModel) -> Response<CorsConfigurationModel> {
        self.put(plan).await
    }

    async fn read(&self, mut state: CorsConfigurationModel) -> Response<CorsConfigurationModel> {
        match self.client.get_bucket_cors(&state.bucket).await {
            Ok(rules) => {
                state.cors_rule = rules.into_iter().map(CorsRuleModel::from).collect();
                Response::ok(state)
            }
            Err(e) if e.is_not_found() => {
                warn!(bucket = %state.bucket, "bucket cors configuration not found, removing from state");
                Response::removed()
            }
            Err(e) => {
                let mut diags = Diagnostics::new();
                diags.add_error("Unable to read bucket CORS configuration", e.to_string());
                Response::failed(diags)
            }
        }
    }

    async fn update(
        &self,
        _prior: CorsConfigurationModel,
        plan: CorsConfigurationModel,
    ) -> Response<CorsConfigurationModel> {
        self.put(plan).await
    }

    async fn delete(&self, state: CorsConfigurationModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        match self.client.delete_bucket_cors(&state.bucket).await {
            Ok(()) => debug!(bucket = %state.bucket, "delete bucket cors completed"),
            Err(e) => diags.add_error("Unable to delete bucket CORS", e.to_string()),
        }
        diags
    }

    fn import_state(&self, id: &str) -> Response<CorsConfigurationModel> {
        Response::ok(CorsConfigurationModel {
            bucket: id.to_owned(),
            cors_rule: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::InMemoryStorageClient;

    async fn setup() -> (Arc<InMemoryStorageClient>, BucketCorsConfigurationResource) {
        let client = Arc::new(InMemoryStorageClient::new("http://localhost:9000"));
        client.create_bucket("site").await.unwrap();
        let resource = BucketCorsConfigurationResource::new(client.clone());
        (client, resource)
    }

    fn plan() -> CorsConfigurationModel {
        serde_json::from_value(json!({
            "bucket": "site",
            "cors_rule": [{
                "allowed_methods": ["PUT", "GET"],
                "allowed_origins": ["https://example.com"],
                "expose_headers": ["ETag"],
                "max_age_seconds": 3000
            }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_should_put_and_read_back_cors_rules() {
        let (client, resource) = setup().await;
        assert_eq!(resource.create(plan()).await.state, Some(plan()));

        let stored = client.get_bucket_cors("site").await.unwrap();
        assert_eq!(stored[0].allowed_methods, vec!["GET", "PUT"]);
        assert!(stored[0].allowed_headers.is_empty());

        let read = resource.read(plan()).await;
        assert_eq!(read.state, Some(plan()));
        assert!(read.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_should_populate_rules_on_import() {
        let (_client, resource) = setup().await;
        resource.create(plan()).await;
        let imported = resource.import_state("site").state.unwrap();
        assert!(imported.cors_rule.is_empty());
        assert_eq!(resource.read(imported).await.state, Some(plan()));
    }

    #[tokio::test]
    async fn test_should_remove_deleted_configuration_from_state() {
        let (_client, resource) = setup().await;
        resource.create(plan()).await;
        assert!(resource.delete(plan()).await.is_empty());
        let read = resource.read(plan()).await;
        assert!(read.state.is_none());
        assert!(!read.has_error());
    }

    #[tokio::test]
    async fn test_should_report_put_on_missing_bucket() {
        let (_client, resource) = setup().await;
        let mut model = plan();
        model.bucket = "other".to_owned();
        let response = resource.create(model).await;
        assert_eq!(
            response.diagnostics.iter().next().map(|d| d.summary.as_str()),
            Some("Unable to create bucket CORS configuration")
        );
    }

    #[test]
    fn test_should_require_methods_and_origins() {
        let resource =
            BucketCorsConfigurationResource::new(Arc::new(InMemoryStorageClient::new("http://x")));
        let mut model = plan();
        model.cors_rule[0].allowed_origins.clear();
        let diags = resource.validate(&model);
        assert_eq!(
            diags.iter().next().and_then(|d| d.attribute.as_deref()),
            Some("cors_rule[0].allowed_origins")
        );
        model.cors_rule.clear();
        assert!(resource.validate(&model).has_error());
    }
}
