//! Object resource integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{cleanup_bucket, create, provider, resource, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running object storage"]
    async fn test_should_manage_object_content() {
        let client = s3_client();
        let provider = provider();
        let bucket = test_bucket_name("object");
        create(
            resource(&provider, "objsto_bucket").as_ref(),
            json!({ "bucket": bucket }),
        )
        .await;

        let objects = resource(&provider, "objsto_object");
        let state = create(
            objects.as_ref(),
            json!({ "bucket": bucket, "key": "dir/hello.txt", "content": "hello" }),
        )
        .await;
        assert_eq!(state["id"], json!(format!("{bucket}/dir/hello.txt")));

        let body = client
            .get_object()
            .bucket(&bucket)
            .key("dir/hello.txt")
            .send()
            .await
            .expect("get_object")
            .body
            .collect()
            .await
            .expect("read body")
            .into_bytes();
        assert_eq!(&body[..], b"hello");

        let mut plan = state.clone();
        plan["content"] = json!("goodbye");
        let updated = objects.update_json(state, plan).await;
        assert!(!updated.has_error(), "{}", updated.diagnostics);

        let imported = objects
            .import_state_json(&format!("{bucket}/dir/hello.txt"))
            .state
            .expect("import");
        let read = objects.read_json(imported).await.state.expect("read");
        assert_eq!(read["content"], json!("goodbye"));

        assert!(objects.delete_json(read.clone()).await.is_empty());
        assert!(objects.read_json(read).await.state.is_none());

        cleanup_bucket(&client, &bucket).await;
    }
}
