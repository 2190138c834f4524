//! Bucket CORS configuration integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{cleanup_bucket, create, provider, resource, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running object storage"]
    async fn test_should_put_and_delete_cors() {
        let client = s3_client();
        let provider = provider();
        let bucket = test_bucket_name("cors");
        create(
            resource(&provider, "objsto_bucket").as_ref(),
            json!({ "bucket": bucket }),
        )
        .await;

        let cors = resource(&provider, "objsto_bucket_cors_configuration");
        let state = create(
            cors.as_ref(),
            json!({
                "bucket": bucket,
                "cors_rule": [{
                    "allowed_methods": ["GET", "PUT"],
                    "allowed_origins": ["https://example.com"],
                    "max_age_seconds": 3600
                }]
            }),
        )
        .await;

        let resp = client
            .get_bucket_cors()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_cors");
        assert!(
            resp.cors_rules()[0]
                .allowed_origins()
                .contains(&"https://example.com".to_owned())
        );

        let read = cors.read_json(state.clone()).await;
        assert_eq!(read.state, Some(state.clone()));

        assert!(cors.delete_json(state.clone()).await.is_empty());
        assert!(cors.read_json(state).await.state.is_none());

        cleanup_bucket(&client, &bucket).await;
    }
}
