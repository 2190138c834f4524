//! `objsto_bucket_lifecycle_configuration` resource.
//!
//! A bucket has at most one lifecycle configuration; this resource owns all of
//! its rules at once and always rewrites the full rule list.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diagnostics::Diagnostics;
use crate::resource::{Resource, Response};
use crate::schema::{Attribute, Block, Schema};
use crate::storage::{
    LifecycleAndOperator, LifecycleExpiration, LifecycleFilter, LifecycleRule,
    NoncurrentVersionExpiration, RuleStatus, StorageClient, Tag,
};
use crate::validation;

const STATUS_ENABLED: &str = "Enabled";
const STATUS_DISABLED: &str = "Disabled";

fn default_status() -> String {
    STATUS_ENABLED.to_owned()
}

/// State of a bucket lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfigurationModel {
    /// Bucket the configuration belongs to.
    pub bucket: String,
    /// Lifecycle rules; empty only right after import.
    #[serde(default)]
    pub rule: Vec<LifecycleRuleModel>,
}

/// One lifecycle rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRuleModel {
    /// Rule identifier.
    pub id: String,
    /// `Enabled` or `Disabled`.
    #[serde(default = "default_status")]
    pub status: String,
    /// Objects the rule applies to.
    pub filter: Option<LifecycleFilterModel>,
    /// Expiration of current versions.
    pub expiration: Option<ExpirationModel>,
    /// Expiration of noncurrent versions.
    pub noncurrent_version_expiration: Option<NoncurrentExpirationModel>,
}

/// Rule filter; exactly one predicate must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleFilterModel {
    /// Minimum object size in bytes.
    pub object_size_larger_than: Option<i64>,
    /// Maximum object size in bytes.
    pub object_size_less_than: Option<i64>,
    /// Key prefix.
    pub prefix: Option<String>,
    /// A single tag.
    pub tag: Option<Tag>,
    /// A logical AND of predicates.
    pub and: Option<LifecycleAndModel>,
}

/// Logical AND filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleAndModel {
    /// Minimum object size in bytes.
    pub object_size_larger_than: Option<i64>,
    /// Maximum object size in bytes.
    pub object_size_less_than: Option<i64>,
    /// Key prefix.
    pub prefix: Option<String>,
    /// Tags that must all match.
    pub tags: Option<BTreeMap<String, String>>,
}

/// Expiration of current versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationModel {
    /// RFC 3339 date; conflicts with `days`.
    pub date: Option<String>,
    /// Days after creation.
    pub days: Option<i32>,
}

/// Expiration of noncurrent versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoncurrentExpirationModel {
    /// Number of newer noncurrent versions to retain.
    pub newer_noncurrent_versions: Option<i32>,
    /// Days after a version becomes noncurrent.
    pub noncurrent_days: Option<i32>,
}

// ---------------------------------------------------------------------------
// Model <-> storage conversion
// ---------------------------------------------------------------------------

fn status_from_str(status: &str) -> RuleStatus {
    if status == STATUS_DISABLED {
        RuleStatus::Disabled
    } else {
        RuleStatus::Enabled
    }
}

fn filter_to_storage(filter: &LifecycleFilterModel) -> LifecycleFilter {
    LifecycleFilter {
        object_size_greater_than: filter.object_size_larger_than,
        object_size_less_than: filter.object_size_less_than,
        prefix: filter.prefix.clone(),
        tag: filter.tag.clone(),
        and: filter.and.as_ref().map(|and| LifecycleAndOperator {
            object_size_greater_than: and.object_size_larger_than,
            object_size_less_than: and.object_size_less_than,
            prefix: and.prefix.clone(),
            tags: and
                .tags
                .iter()
                .flatten()
                .map(|(key, value)| Tag {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }),
    }
}

/// Build storage rules, reporting every unparsable date.
fn rules_to_storage(model: &LifecycleConfigurationModel) -> Result<Vec<LifecycleRule>, Diagnostics> {
    let mut diags = Diagnostics::new();
    let mut rules = Vec::with_capacity(model.rule.len());
    for (i, rule) in model.rule.iter().enumerate() {
        let expiration = rule.expiration.as_ref().map(|e| LifecycleExpiration {
            date: e.date.as_deref().and_then(|date| {
                validation::rfc3339(&mut diags, &format!("rule[{i}].expiration.date"), date)
            }),
            days: e.days,
        });
        rules.push(LifecycleRule {
            id: Some(rule.id.clone()),
            status: status_from_str(&rule.status),
            filter: rule.filter.as_ref().map(filter_to_storage),
            expiration,
            noncurrent_version_expiration: rule.noncurrent_version_expiration.as_ref().map(|n| {
                NoncurrentVersionExpiration {
                    newer_noncurrent_versions: n.newer_noncurrent_versions,
                    noncurrent_days: n.noncurrent_days,
                }
            }),
        });
    }
    if diags.has_error() {
        Err(diags)
    } else {
        Ok(rules)
    }
}

fn rule_from_storage(rule: LifecycleRule) -> LifecycleRuleModel {
    LifecycleRuleModel {
        id: rule.id.unwrap_or_default(),
        status: rule.status.as_str().to_owned(),
        filter: rule.filter.map(|f| LifecycleFilterModel {
            object_size_larger_than: f.object_size_greater_than,
            object_size_less_than: f.object_size_less_than,
            prefix: f.prefix,
            tag: f.tag,
            and: f.and.map(|a| LifecycleAndModel {
                object_size_larger_than: a.object_size_greater_than,
                object_size_less_than: a.object_size_less_than,
                prefix: a.prefix,
                tags: (!a.tags.is_empty())
                    .then(|| a.tags.into_iter().map(|t| (t.key, t.value)).collect()),
            }),
        }),
        expiration: rule.expiration.map(|e| ExpirationModel {
            date: e
                .date
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            days: e.days,
        }),
        noncurrent_version_expiration: rule.noncurrent_version_expiration.map(|n| {
            NoncurrentExpirationModel {
                newer_noncurrent_versions: n.newer_noncurrent_versions,
                noncurrent_days: n.noncurrent_days,
            }
        }),
    }
}

/// Manages the lifecycle configuration of a bucket.
pub struct BucketLifecycleConfigurationResource {
    client: Arc<dyn StorageClient>,
}

impl fmt::Debug for BucketLifecycleConfigurationResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketLifecycleConfigurationResource")
            .field("endpoint", &self.client.endpoint())
            .finish()
    }
}

impl BucketLifecycleConfigurationResource {
    /// Create the resource on top of `client`.
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        Self { client }
    }

    async fn put(&self, plan: LifecycleConfigurationModel) -> Response<LifecycleConfigurationModel> {
        let rules = match rules_to_storage(&plan) {
            Ok(rules) => rules,
            Err(diags) => return Response::failed(diags),
        };
        if let Err(e) = self.client.put_bucket_lifecycle(&plan.bucket, &rules).await {
            let mut diags = Diagnostics::new();
            diags.add_error("Unable to create bucket lifecycle configuration", e.to_string());
            return Response::failed(diags);
        }
        debug!(bucket = %plan.bucket, rules = rules.len(), "put bucket lifecycle configuration completed");
        Response::ok(plan)
    }
}

fn rule_schema() -> Block {
    let and = Block::single("A logical AND filter.")
        .attribute(
            "object_size_larger_than",
            Attribute::int64("The minimum object size in bytes."),
        )
        .attribute(
            "object_size_less_than",
            Attribute::int64("The maximum object size in bytes."),
        )
        .attribute("prefix", Attribute::string("The prefix of the object key."))
        .attribute("tags", Attribute::string_map("The tags of the object."));
    let filter = Block::single("A filter to select object that the rule applies to.")
        .required()
        .attribute(
            "object_size_larger_than",
            Attribute::int64("The minimum object size in bytes."),
        )
        .attribute(
            "object_size_less_than",
            Attribute::int64("The maximum object size in bytes."),
        )
        .attribute("prefix", Attribute::string("The prefix of the object key."))
        .attribute(
            "tag",
            Attribute::object(
                "The tag of the object.",
                [
                    ("key", Attribute::string("The key of the tag.").required()),
                    ("value", Attribute::string("The value of the tag.").required()),
                ],
            ),
        )
        .block("and", and);
    let expiration = Block::single("The expiration of the object.")
        .attribute(
            "date",
            Attribute::string("The date of the expiration. Must be a valid RFC3339 timestamp."),
        )
        .attribute("days", Attribute::int32("The number of days until expiration."));
    let noncurrent = Block::single("The expiration of the noncurrent versions of the object.")
        .attribute(
            "newer_noncurrent_versions",
            Attribute::int32("The number of newer noncurrent versions."),
        )
        .attribute(
            "noncurrent_days",
            Attribute::int32("The number of days until expiration of the noncurrent versions."),
        );
    Block::list("The lifecycle rules to apply to the bucket.")
        .min_items(1)
        .attribute("id", Attribute::string("The identifier of the rule.").required())
        .attribute(
            "status",
            Attribute::string("The status of the rule.")
                .default_value(STATUS_ENABLED)
                .one_of(&[STATUS_ENABLED, STATUS_DISABLED]),
        )
        .block("filter", filter)
        .block("expiration", expiration)
        .block("noncurrent_version_expiration", noncurrent)
}

#[async_trait]
impl Resource for BucketLifecycleConfigurationResource {
    type Model = LifecycleConfigurationModel;

    const TYPE_NAME: &'static str = "objsto_bucket_lifecycle_configuration";

    fn schema(&self) -> Schema {
        Schema::new(
            "A bucket lifecycle configuration resource. Note that there can only be one lifecycle configuration per bucket.",
        )
        .attribute(
            "bucket",
            Attribute::string("The name of the bucket for which to configure the lifecycle policy.")
                .required()
                .requires_replace(),
        )
        .block("rule", rule_schema())
    }

    fn validate(&self, model: &LifecycleConfigurationModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validation::not_empty(&mut diags, "bucket", &model.bucket);
        validation::size_at_least(&mut diags, "rule", model.rule.len(), 1);

        for (i, rule) in model.rule.iter().enumerate() {
            let path = format!("rule[{i}]");
            validation::one_of(
                &mut diags,
                &format!("{path}.status"),
                &rule.status,
                &[STATUS_ENABLED, STATUS_DISABLED],
            );

            match &rule.filter {
                Some(f) => {
                    validation::exactly_one_of(
                        &mut diags,
                        &format!("{path}.filter"),
                        [
                            ("object_size_larger_than", f.object_size_larger_than.is_some()),
                            ("object_size_less_than", f.object_size_less_than.is_some()),
                            ("prefix", f.prefix.is_some()),
                            ("tag", f.tag.is_some()),
                            ("and", f.and.is_some()),
                        ],
                    );
                    if let Some(tags) = f.and.as_ref().and_then(|a| a.tags.as_ref()) {
                        if tags.is_empty() {
                            diags.add_attribute_error(
                                format!("{path}.filter.and.tags"),
                                "Invalid Attribute Value",
                                "Attribute tags map must contain at least 1 elements, got: 0",
                            );
                        }
                    }
                }
                None => diags.add_attribute_error(
                    format!("{path}.filter"),
                    "Missing required block",
                    "Every lifecycle rule needs a filter block.",
                ),
            }

            if let Some(e) = &rule.expiration {
                let date_path = format!("{path}.expiration.date");
                validation::conflicts_with(
                    &mut diags,
                    &date_path,
                    e.date.is_some(),
                    &format!("{path}.expiration.days"),
                    e.days.is_some(),
                );
                if let Some(date) = &e.date {
                    validation::rfc3339(&mut diags, &date_path, date);
                }
            }
        }
        diags
    }

    async fn create(&self, plan: LifecycleConfigurationModel) -> Response<LifecycleConfigurationModel> {
        self.put(plan).await
    }

    async fn read(&self, mut state: LifecycleConfigurationModel) -> Response<LifecycleConfigurationModel> {
        match self.client.get_bucket_lifecycle(&state.bucket).await {
            Ok(rules) => {
                state.rule = rules.into_iter().map(rule_from_storage).collect();
                Response::ok(state)
            }
            Err(e) if e.is_not_found() => {
                warn!(bucket = %state.bucket, "bucket lifecycle configuration not found, removing from state");
                Response::removed()
            }
            Err(e) => {
                let mut diags = Diagnostics::new();
                diags.add_error("Unable to read bucket lifecycle configuration", e.to_string());
                Response::failed(diags)
            }
        }
    }

    async fn update(
        &self,
        _prior: LifecycleConfigurationModel,
        plan: LifecycleConfigurationModel,
    ) -> Response<LifecycleConfigurationModel> {
        self.put(plan).await
    }

    async fn delete(&self, state: LifecycleConfigurationModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        match self.client.delete_bucket_lifecycle(&state.bucket).await {
            Ok(()) => debug!(bucket = %state.bucket, "delete bucket lifecycle completed"),
            Err(e) => diags.add_error("Unable to delete bucket lifecycle", e.to_string()),
        }
        diags
    }

    fn import_state(&self, id: &str) -> Response<LifecycleConfigurationModel> {
        Response::ok(LifecycleConfigurationModel {
            bucket: id.to_owned(),
            rule: Vec::new(),
        })
    }
}
