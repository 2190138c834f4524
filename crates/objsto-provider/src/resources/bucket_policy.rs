//! `objsto_bucket_policy` resource.
//!
//! Services rarely return a policy document exactly as it was written, so the
//! configured text is kept in state and compared with the remote document only
//! after both are normalized (see [`objsto_policy`]). A semantic difference is
//! reported as drift; a formatting difference is invisible.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use objsto_policy::{ensure_consistent, equivalent, normalize_policy_document};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diagnostics::Diagnostics;
use crate::resource::{Resource, Response};
use crate::schema::{Attribute, Schema};
use crate::storage::StorageClient;
use crate::validation;

/// Description shown for the replacement rule of `policy`.
pub const POLICY_REPLACE_DESCRIPTION: &str = "Policy document requires replace if the document in state does not match planned document after removing whitespace and unnecessary escapes.";

/// State of a bucket policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPolicyModel {
    /// Bucket the policy is attached to.
    pub bucket: String,
    /// Policy document as configured. Empty only right after import.
    #[serde(default)]
    pub policy: Option<String>,
}

fn missing_policy(diags: &mut Diagnostics) {
    diags.add_attribute_error(
        "policy",
        "Missing required argument",
        "The argument \"policy\" is required, but no definition was found.",
    );
}

/// Manages the policy document of a bucket.
pub struct BucketPolicyResource {
    client: Arc<dyn StorageClient>,
}

impl fmt::Debug for BucketPolicyResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketPolicyResource")
            .field("endpoint", &self.client.endpoint())
            .finish()
    }
}

impl BucketPolicyResource {
    /// Create the resource on top of `client`.
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for BucketPolicyResource {
    type Model = BucketPolicyModel;

    const TYPE_NAME: &'static str = "objsto_bucket_policy";

    fn schema(&self) -> Schema {
        Schema::new(
            "A bucket policy resource that represents a bucket policy in an object storage service.",
        )
        .attribute(
            "bucket",
            Attribute::string("The name of the bucket.")
                .required()
                .requires_replace(),
        )
        .attribute(
            "policy",
            Attribute::string(format!(
                "The policy to attach to the bucket. {POLICY_REPLACE_DESCRIPTION}"
            ))
            .required(),
        )
    }

    fn validate(&self, model: &BucketPolicyModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validation::not_empty(&mut diags, "bucket", &model.bucket);
        match &model.policy {
            Some(policy) => {
                if let Err(e) = normalize_policy_document(policy) {
                    diags.extend([e]);
                }
            }
            None => missing_policy(&mut diags),
        }
        diags
    }

    async fn create(&self, plan: BucketPolicyModel) -> Response<BucketPolicyModel> {
        let Some(policy) = plan.policy.as_deref() else {
            let mut diags = Diagnostics::new();
            missing_policy(&mut diags);
            return Response::failed(diags);
        };
        if let Err(e) = self.client.put_bucket_policy(&plan.bucket, policy).await {
            let mut diags = Diagnostics::new();
            diags.add_error("Unable to put bucket policy", e.to_string());
            return Response::failed(diags);
        }
        debug!(bucket = %plan.bucket, "put bucket policy completed");
        Response::ok(plan)
    }

    async fn read(&self, mut state: BucketPolicyModel) -> Response<BucketPolicyModel> {
        let remote = match self.client.get_bucket_policy(&state.bucket).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                warn!(bucket = %state.bucket, "bucket policy not found, removing from state");
                return Response::removed();
            }
            Err(e) => {
                let mut diags = Diagnostics::new();
                diags.add_error("Unable to read bucket policy", e.to_string());
                return Response::failed(diags);
            }
        };

        let mut diags = Diagnostics::new();
        match &state.policy {
            // Only an imported resource has no configured document yet.
            None => match normalize_policy_document(&remote) {
                Ok(normalized) => state.policy = Some(normalized),
                Err(e) => diags.extend([e]),
            },
            Some(configured) => {
                if let Err(errors) = ensure_consistent(configured, &remote) {
                    diags.extend(errors);
                }
            }
        }
        Response::from_parts(state, diags)
    }

    async fn update(
        &self,
        _prior: BucketPolicyModel,
        plan: BucketPolicyModel,
    ) -> Response<BucketPolicyModel> {
        // Any semantic change replaces the resource, so an update only
        // carries a reformatted document into state.
        Response::ok(plan)
    }

    async fn delete(&self, state: BucketPolicyModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        match self.client.delete_bucket_policy(&state.bucket).await {
            Ok(()) => debug!(bucket = %state.bucket, "delete bucket policy completed"),
            Err(e) => diags.add_error("Unable to delete bucket policy", e.to_string()),
        }
        diags
    }

    fn import_state(&self, id: &str) -> Response<BucketPolicyModel> {
        Response::ok(BucketPolicyModel {
            bucket: id.to_owned(),
            policy: None,
        })
    }

    fn requires_replace(
        &self,
        prior: &BucketPolicyModel,
        plan: &BucketPolicyModel,
    ) -> Result<bool, Diagnostics> {
        if prior.bucket != plan.bucket {
            return Ok(true);
        }
        match (&prior.policy, &plan.policy) {
            (Some(prior), Some(plan)) => equivalent(prior, plan)
                .map(|same| !same)
                .map_err(Diagnostics::from),
            (prior, plan) => Ok(prior.is_some() != plan.is_some()),
        }
    }
}
