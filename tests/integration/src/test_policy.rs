//! Bucket policy resource integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{cleanup_bucket, create, provider, resource, s3_client, test_bucket_name};

    fn public_read(bucket: &str) -> String {
        json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*")
            }]
        })
        .to_string()
    }

    #[tokio::test]
    #[ignore = "requires running object storage"]
    async fn test_should_apply_policy_without_drift() {
        let client = s3_client();
        let provider = provider();
        let bucket = test_bucket_name("policy");
        create(
            resource(&provider, "objsto_bucket").as_ref(),
            json!({ "bucket": bucket }),
        )
        .await;

        let policies = resource(&provider, "objsto_bucket_policy");
        let state = create(
            policies.as_ref(),
            json!({ "bucket": bucket, "policy": public_read(&bucket) }),
        )
        .await;

        // The service reformats the document; the read must still be clean.
        let read = policies.read_json(state.clone()).await;
        assert!(read.diagnostics.is_empty(), "{}", read.diagnostics);
        assert_eq!(read.state, Some(state.clone()));

        let imported = policies.import_state_json(&bucket).state.expect("import");
        let imported = policies.read_json(imported).await.state.expect("read");
        assert!(imported["policy"].as_str().is_some_and(|p| p.contains("\"AWS\"")));

        assert!(policies.delete_json(state).await.is_empty());
        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running object storage"]
    async fn test_should_serve_objects_anonymously_with_public_policy() {
        let client = s3_client();
        let provider = provider();
        let bucket = test_bucket_name("public");
        create(
            resource(&provider, "objsto_bucket").as_ref(),
            json!({ "bucket": bucket }),
        )
        .await;
        create(
            resource(&provider, "objsto_bucket_policy").as_ref(),
            json!({ "bucket": bucket, "policy": public_read(&bucket) }),
        )
        .await;
        let object = create(
            resource(&provider, "objsto_object").as_ref(),
            json!({ "bucket": bucket, "key": "index.html", "content": "<h1>hi</h1>" }),
        )
        .await;

        let url = object["url"].as_str().expect("url");
        let body = reqwest::get(url)
            .await
            .expect("GET object url")
            .text()
            .await
            .expect("body");
        assert_eq!(body, "<h1>hi</h1>");

        cleanup_bucket(&client, &bucket).await;
    }
}
