//! Bucket resource integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{cleanup_bucket, create, provider, resource, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running object storage"]
    async fn test_should_create_read_and_delete_bucket() {
        let client = s3_client();
        let provider = provider();
        let buckets = resource(&provider, "objsto_bucket");
        let bucket = test_bucket_name("bucket");

        let state = create(buckets.as_ref(), json!({ "bucket": bucket })).await;
        client
            .head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("bucket should exist");

        let read = buckets.read_json(state.clone()).await;
        assert_eq!(read.state, Some(state.clone()));

        assert!(buckets.delete_json(state.clone()).await.is_empty());
        let gone = buckets.read_json(state).await;
        assert!(gone.state.is_none());
        assert!(!gone.has_error());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running object storage"]
    async fn test_should_report_duplicate_bucket() {
        let client = s3_client();
        let provider = provider();
        let buckets = resource(&provider, "objsto_bucket");
        let bucket = test_bucket_name("dup");

        create(buckets.as_ref(), json!({ "bucket": bucket })).await;
        let again = buckets.create_json(json!({ "bucket": bucket })).await;
        assert!(again.has_error());
        assert_eq!(
            again.diagnostics.iter().next().map(|d| d.summary.as_str()),
            Some("Unable to create bucket")
        );

        cleanup_bucket(&client, &bucket).await;
    }
}
