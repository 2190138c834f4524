//! `objsto_object` resource.
//!
//! An object is identified by `{bucket}/{key}`. The identifier is parsed on
//! every read, so a state written by hand or by import behaves the same as
//! one written by `create`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use objsto_core::{ObjectId, object_url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diagnostics::Diagnostics;
use crate::resource::{Resource, Response};
use crate::schema::{Attribute, Schema};
use crate::storage::StorageClient;
use crate::validation;

/// State of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectModel {
    /// Bucket holding the object.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Object body as text.
    #[serde(default)]
    pub content: String,
    /// `{bucket}/{key}`; computed.
    #[serde(default)]
    pub id: Option<String>,
    /// Path-style URL of the object; computed.
    #[serde(default)]
    pub url: Option<String>,
}

impl ObjectModel {
    fn object_id(&self) -> Result<ObjectId, Diagnostics> {
        match &self.id {
            Some(id) => id.parse().map_err(Diagnostics::from),
            None => Ok(ObjectId::new(&self.bucket, &self.key)),
        }
    }
}

/// Manages a single object and its content.
pub struct ObjectResource {
    client: Arc<dyn StorageClient>,
}

impl fmt::Debug for ObjectResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectResource")
            .field("endpoint", &self.client.endpoint())
            .finish()
    }
}

impl ObjectResource {
    /// Create the resource on top of `client`.
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        Self { client }
    }

    async fn put(&self, mut plan: ObjectModel) -> Response<ObjectModel> {
        let id = ObjectId::new(&plan.bucket, &plan.key);
        plan.url = Some(object_url(self.client.endpoint(), id.bucket(), id.key()));
        plan.id = Some(id.to_string());

        let body = Bytes::from(plan.content.clone());
        if let Err(e) = self.client.put_object(&plan.bucket, &plan.key, body).await {
            let mut diags = Diagnostics::new();
            diags.add_error("Unable to create object", e.to_string());
            return Response::failed(diags);
        }
        debug!(bucket = %plan.bucket, key = %plan.key, "put object completed");
        Response::ok(plan)
    }
}

#[async_trait]
impl Resource for ObjectResource {
    type Model = ObjectModel;

    const TYPE_NAME: &'static str = "objsto_object";

    fn schema(&self) -> Schema {
        Schema::new("An object resource.")
            .attribute(
                "id",
                Attribute::string("The id of the object. The id is in `{bucket}/{key}` format.")
                    .computed(),
            )
            .attribute(
                "bucket",
                Attribute::string("The name of the bucket.")
                    .required()
                    .requires_replace(),
            )
            .attribute(
                "key",
                Attribute::string("The key of the object.")
                    .required()
                    .requires_replace(),
            )
            .attribute(
                "content",
                Attribute::string("The content of the object.").required(),
            )
            .attribute("url", Attribute::string("The URL of the object.").computed())
    }

    fn validate(&self, model: &ObjectModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validation::not_empty(&mut diags, "bucket", &model.bucket);
        validation::not_empty(&mut diags, "key", &model.key);
        diags
    }

    async fn create(&self, plan: ObjectModel) -> Response<ObjectModel> {
        self.put(plan).await
    }

    async fn read(&self, mut state: ObjectModel) -> Response<ObjectModel> {
        let id = match state.object_id() {
            Ok(id) => id,
            Err(diags) => return Response::failed(diags),
        };

        let object = match self.client.get_object(id.bucket(), id.key()).await {
            Ok(object) => object,
            Err(e) if e.is_not_found() => {
                warn!(%id, "object not found, removing from state");
                return Response::removed();
            }
            Err(e) => {
                let mut diags = Diagnostics::new();
                diags.add_error("Unable to read object", e.to_string());
                return Response::failed(diags);
            }
        };

        let mut diags = Diagnostics::new();
        let got = object.body.len();
        if let Some(expected) = object.content_length {
            if usize::try_from(expected).ok() != Some(got) {
                diags.add_error(
                    "Unable to read object content",
                    format!("expected {expected} bytes, got {got}"),
                );
                return Response::failed(diags);
            }
        }
        match String::from_utf8(object.body.to_vec()) {
            Ok(content) => state.content = content,
            Err(e) => {
                diags.add_error("Unable to read object content", e.to_string());
                return Response::failed(diags);
            }
        }

        state.url = Some(object_url(self.client.endpoint(), id.bucket(), id.key()));
        state.id = Some(id.to_string());
        let (bucket, key) = id.into_parts();
        state.bucket = bucket;
        state.key = key;
        Response::ok(state)
    }

    async fn update(&self, _prior: ObjectModel, plan: ObjectModel) -> Response<ObjectModel> {
        self.put(plan).await
    }

    async fn delete(&self, state: ObjectModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        match self.client.delete_object(&state.bucket, &state.key).await {
            Ok(()) => debug!(bucket = %state.bucket, key = %state.key, "delete object completed"),
            Err(e) => diags.add_error("Unable to delete object", e.to_string()),
        }
        diags
    }

    fn import_state(&self, id: &str) -> Response<ObjectModel> {
        match id.parse::<ObjectId>() {
            Ok(parsed) => {
                let (bucket, key) = parsed.into_parts();
                Response::ok(ObjectModel {
                    bucket,
                    key,
                    content: String::new(),
                    id: Some(id.to_owned()),
                    url: None,
                })
            }
            Err(e) => Response::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CorsRule, InMemoryStorageClient, LifecycleRule, StorageResult, StoredObject};

    async fn setup() -> (Arc<InMemoryStorageClient>, ObjectResource) {
        let client = Arc::new(InMemoryStorageClient::new("http://localhost:9000/"));
        client.create_bucket("assets").await.unwrap();
        let resource = ObjectResource::new(client.clone());
        (client, resource)
    }

    fn plan(key: &str, content: &str) -> ObjectModel {
        ObjectModel {
            bucket: "assets".to_owned(),
            key: key.to_owned(),
            content: content.to_owned(),
            id: None,
            url: None,
        }
    }

    #[tokio::test]
    async fn test_should_compute_id_and_url_on_create() {
        let (client, resource) = setup().await;
        let state = resource.create(plan("dir/hello.txt", "hi")).await.state.unwrap();
        assert_eq!(state.id.as_deref(), Some("assets/dir/hello.txt"));
        assert_eq!(
            state.url.as_deref(),
            Some("http://localhost:9000/assets/dir/hello.txt")
        );
        let stored = client.get_object("assets", "dir/hello.txt").await.unwrap();
        assert_eq!(stored.body, Bytes::from_static(b"hi"));
    }

    #[tokio::test]
    async fn test_should_refresh_content_on_read() {
        let (client, resource) = setup().await;
        let state = resource.create(plan("a.txt", "v1")).await.state.unwrap();
        client
            .put_object("assets", "a.txt", Bytes::from_static(b"v2"))
            .await
            .unwrap();
        let read = resource.read(state).await.state.unwrap();
        assert_eq!(read.content, "v2");
    }

    #[tokio::test]
    async fn test_should_import_and_read_object() {
        let (client, resource) = setup().await;
        client
            .put_object("assets", "x/y.json", Bytes::from_static(b"{}"))
            .await
            .unwrap();
        let imported = resource.import_state("assets/x/y.json").state.unwrap();
        assert_eq!(imported.key, "x/y.json");

        let read = resource.read(imported).await.state.unwrap();
        assert_eq!(read.content, "{}");
        assert_eq!(
            read.url.as_deref(),
            Some("http://localhost:9000/assets/x/y.json")
        );
    }

    #[test]
    fn test_should_reject_import_id_without_key() {
        let (_client, resource) = tokio_test::block_on(setup());
        let response = resource.import_state("assets");
        assert!(response.state.is_none());
        assert_eq!(
            response.diagnostics.iter().next().map(|d| d.summary.as_str()),
            Some("Unable to parse object id")
        );
    }

    #[tokio::test]
    async fn test_should_remove_deleted_object_from_state() {
        let (_client, resource) = setup().await;
        let state = resource.create(plan("gone.txt", "x")).await.state.unwrap();
        assert!(resource.delete(state.clone()).await.is_empty());
        let read = resource.read(state).await;
        assert!(read.state.is_none());
        assert!(!read.has_error());
    }

    #[tokio::test]
    async fn test_should_replace_on_key_change_only() {
        let (_client, resource) = setup().await;
        assert!(resource
            .requires_replace(&plan("a", "x"), &plan("b", "x"))
            .unwrap());
        assert!(!resource
            .requires_replace(&plan("a", "x"), &plan("a", "y"))
            .unwrap());
    }

    /// Reports a content length that disagrees with the body.
    struct ShortRead(InMemoryStorageClient);

    #[async_trait]
    impl StorageClient for ShortRead {
        fn endpoint(&self) -> &str {
            self.0.endpoint()
        }
        async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
            self.0.create_bucket(bucket).await
        }
        async fn head_bucket(&self, bucket: &str) -> StorageResult<()> {
            self.0.head_bucket(bucket).await
        }
        async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
            self.0.delete_bucket(bucket).await
        }
        async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> StorageResult<()> {
            self.0.put_bucket_policy(bucket, policy).await
        }
        async fn get_bucket_policy(&self, bucket: &str) -> StorageResult<String> {
            self.0.get_bucket_policy(bucket).await
        }
        async fn delete_bucket_policy(&self, bucket: &str) -> StorageResult<()> {
            self.0.delete_bucket_policy(bucket).await
        }
        async fn put_bucket_lifecycle(
            &self,
            bucket: &str,
            rules: &[LifecycleRule],
        ) -> StorageResult<()> {
            self.0.put_bucket_lifecycle(bucket, rules).await
        }
        async fn get_bucket_lifecycle(
            &self,
            bucket: &str,
        ) -> StorageResult<Vec<LifecycleRule>> {
            self.0.get_bucket_lifecycle(bucket).await
        }
        async fn delete_bucket_lifecycle(&self, bucket: &str) -> StorageResult<()> {
            self.0.delete_bucket_lifecycle(bucket).await
        }
        async fn put_bucket_cors(
            &self,
            bucket: &str,
            rules: &[CorsRule],
        ) -> StorageResult<()> {
            self.0.put_bucket_cors(bucket, rules).await
        }
        async fn get_bucket_cors(&self, bucket: &str) -> StorageResult<Vec<CorsRule>> {
            self.0.get_bucket_cors(bucket).await
        }
        async fn delete_bucket_cors(&self, bucket: &str) -> StorageResult<()> {
            self.0.delete_bucket_cors(bucket).await
        }
        async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> StorageResult<()> {
            self.0.put_object(bucket, key, body).await
        }
        async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
            let mut object = self.0.get_object(bucket, key).await?;
            object.content_length = object.content_length.map(|n| n + 1);
            Ok(object)
        }
        async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
            self.0.delete_object(bucket, key).await
        }
    }

    #[tokio::test]
    async fn test_should_reject_truncated_body() {
        let client = Arc::new(ShortRead(InMemoryStorageClient::new("http://s3")));
        client.create_bucket("b").await.unwrap();
        let resource = ObjectResource::new(client);
        let state = resource
            .create(ObjectModel {
                bucket: "b".to_owned(),
                ..plan("k", "abc")
            })
            .await
            .state
            .unwrap();

        let read = resource.read(state).await;
        assert!(read.state.is_none());
        let diag = read.diagnostics.iter().next().unwrap();
        assert_eq!(diag.summary, "Unable to read object content");
        assert_eq!(diag.detail, "expected 4 bytes, got 3");
    }
}
