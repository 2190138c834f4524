//! `objsto_bucket` resource.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diagnostics::Diagnostics;
use crate::resource::{Resource, Response};
use crate::schema::{Attribute, Schema};
use crate::storage::StorageClient;
use crate::validation;

/// State of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketModel {
    /// Bucket name.
    pub bucket: String,
}

/// Manages a storage bucket.
pub struct BucketResource {
    client: Arc<dyn StorageClient>,
}

impl fmt::Debug for BucketResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketResource")
            .field("endpoint", &self.client.endpoint())
            .finish()
    }
}

impl BucketResource {
    /// Create the resource on top of `client`.
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for BucketResource {
    type Model = BucketModel;

    const TYPE_NAME: &'static str = "objsto_bucket";

    fn schema(&self) -> Schema {
        Schema::new("A bucket resource.").attribute(
            "bucket",
            Attribute::string("The name of the bucket.")
                .required()
                .requires_replace(),
        )
    }

    fn validate(&self, model: &BucketModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validation::not_empty(&mut diags, "bucket", &model.bucket);
        diags
    }

    async fn create(&self, plan: BucketModel) -> Response<BucketModel> {
        if let Err(e) = self.client.create_bucket(&plan.bucket).await {
            let mut diags = Diagnostics::new();
            diags.add_error("Unable to create bucket", e.to_string());
            return Response::failed(diags);
        }
        debug!(bucket = %plan.bucket, "create bucket completed");
        Response::ok(plan)
    }

    async fn read(&self, state: BucketModel) -> Response<BucketModel> {
        match self.client.head_bucket(&state.bucket).await {
            Ok(()) => Response::ok(state),
            Err(e) if e.is_not_found() => {
                warn!(bucket = %state.bucket, "bucket not found, removing from state");
                Response::removed()
            }
            Err(e) => {
                let mut diags = Diagnostics::new();
                diags.add_error("Unable to read bucket", e.to_string());
                Response::failed(diags)
            }
        }
    }

    async fn update(&self, _prior: BucketModel, plan: BucketModel) -> Response<BucketModel> {
        Response::ok(plan)
    }

    async fn delete(&self, state: BucketModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        match self.client.delete_bucket(&state.bucket).await {
            Ok(()) => debug!(bucket = %state.bucket, "delete bucket completed"),
            Err(e) => diags.add_error("Unable to delete bucket", e.to_string()),
        }
        diags
    }

    fn import_state(&self, id: &str) -> Response<BucketModel> {
        Response::ok(BucketModel {
            bucket: id.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorageClient;

    fn setup() -> (Arc<InMemoryStorageClient>, BucketResource) {
        let client = Arc::new(InMemoryStorageClient::new("http://localhost:9000"));
        let resource = BucketResource::new(client.clone());
        (client, resource)
    }

    fn model(name: &str) -> BucketModel {
        BucketModel {
            bucket: name.to_owned(),
        }
    }

    #[test]
    fn test_should_show_endpoint_in_debug_output() {
        let (_client, resource) = setup();
        assert_eq!(
            format!("{resource:?}"),
            r#"BucketResource { endpoint: "http://localhost:9000" }"#
        );
    }

    #[tokio::test]
    async fn test_should_create_and_read_bucket() {
        let (client, resource) = setup();
        let created = resource.create(model("assets")).await;
        assert_eq!(created.state, Some(model("assets")));
        assert!(client.head_bucket("assets").await.is_ok());

        let read = resource.read(model("assets")).await;
        assert_eq!(read.state, Some(model("assets")));
        assert!(read.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_should_remove_vanished_bucket_from_state() {
        let (_client, resource) = setup();
        let read = resource.read(model("gone")).await;
        assert!(read.state.is_none());
        assert!(!read.has_error());
    }

    #[tokio::test]
    async fn test_should_report_duplicate_create() {
        let (_client, resource) = setup();
        resource.create(model("b")).await;
        let again = resource.create(model("b")).await;
        assert!(again.state.is_none());
        assert_eq!(
            again.diagnostics.iter().next().map(|d| d.summary.as_str()),
            Some("Unable to create bucket")
        );
    }

    #[tokio::test]
    async fn test_should_delete_bucket() {
        let (client, resource) = setup();
        resource.create(model("b")).await;
        assert!(resource.delete(model("b")).await.is_empty());
        assert!(client.head_bucket("b").await.unwrap_err().is_not_found());
        assert!(resource.delete(model("b")).await.has_error());
    }

    #[test]
    fn test_should_import_by_name_and_replace_on_rename() {
        let (_client, resource) = setup();
        assert_eq!(resource.import_state("logs").state, Some(model("logs")));
        assert!(resource.requires_replace(&model("a"), &model("b")).unwrap());
        assert!(!resource.requires_replace(&model("a"), &model("a")).unwrap());
        assert!(resource.validate(&model("")).has_error());
    }
}
