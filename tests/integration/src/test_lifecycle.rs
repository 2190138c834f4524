//! Bucket lifecycle configuration integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{cleanup_bucket, create, provider, resource, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running object storage"]
    async fn test_should_put_and_read_lifecycle_rules() {
        let client = s3_client();
        let provider = provider();
        let bucket = test_bucket_name("lifecycle");
        create(
            resource(&provider, "objsto_bucket").as_ref(),
            json!({ "bucket": bucket }),
        )
        .await;

        let lifecycle = resource(&provider, "objsto_bucket_lifecycle_configuration");
        let state = create(
            lifecycle.as_ref(),
            json!({
                "bucket": bucket,
                "rule": [
                    {"id": "tmp", "filter": {"prefix": "tmp/"}, "expiration": {"days": 7}},
                    {
                        "id": "archive",
                        "status": "Disabled",
                        "filter": {"and": {"prefix": "logs/", "tags": {"tier": "cold"}}},
                        "expiration": {"date": "2040-01-01T00:00:00Z"}
                    }
                ]
            }),
        )
        .await;

        let resp = client
            .get_bucket_lifecycle_configuration()
            .bucket(&bucket)
            .send()
            .await
            .expect("get lifecycle");
        assert_eq!(resp.rules().len(), 2);

        let read = lifecycle.read_json(state.clone()).await;
        assert!(!read.has_error(), "{}", read.diagnostics);
        let read = read.state.expect("state");
        assert_eq!(read["rule"][0]["expiration"]["days"], json!(7));
        assert_eq!(
            read["rule"][1]["expiration"]["date"],
            json!("2040-01-01T00:00:00Z")
        );

        assert!(lifecycle.delete_json(state.clone()).await.is_empty());
        assert!(lifecycle.read_json(state).await.state.is_none());

        cleanup_bucket(&client, &bucket).await;
    }
}
