//! Routing integration tests.

#[cfg(test)]
mod tests {
    use crate::{client, error_code, test_bucket_name, url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_health_check() -> anyhow::Result<()> {
        let resp = client().get(url("/_health")).send().await?;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert!(resp.text().await?.contains("running"));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reach_handler_for_routed_get_object() -> anyhow::Result<()> {
        let bucket = test_bucket_name("get");
        let resp = client()
            .get(url(&format!("/{bucket}/dir/file.txt")))
            .send()
            .await?;

        assert_eq!(resp.status(), reqwest::StatusCode::NOT_IMPLEMENTED);
        assert!(resp.headers().contains_key("x-amz-request-id"));
        assert_eq!(
            resp.headers()
                .get("server")
                .and_then(|v| v.to_str().ok()),
            Some("BucketGate")
        );
        let body = resp.text().await?;
        assert_eq!(error_code(&body), Some("NotImplemented"));
        assert!(body.contains("GetObject"));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_route_tagging_separately_from_get_object() -> anyhow::Result<()> {
        let bucket = test_bucket_name("tagging");
        let resp = client()
            .get(url(&format!("/{bucket}/file.txt?tagging=")))
            .send()
            .await?;
        let body = resp.text().await?;
        assert!(body.contains("GetObjectTagging"));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_route_copy_object_by_header() -> anyhow::Result<()> {
        let bucket = test_bucket_name("copy");
        let resp = client()
            .put(url(&format!("/{bucket}/dst.txt")))
            .header("x-amz-copy-source", format!("/{bucket}/src.txt"))
            .send()
            .await?;
        assert!(resp.text().await?.contains("CopyObject"));

        let resp = client()
            .put(url(&format!("/{bucket}/dst.txt")))
            .body("data")
            .send()
            .await?;
        assert!(resp.text().await?.contains("PutObject"));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_method_with_method_not_allowed() -> anyhow::Result<()> {
        let bucket = test_bucket_name("patch");
        let resp = client()
            .patch(url(&format!("/{bucket}/file.txt")))
            .send()
            .await?;

        assert_eq!(resp.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
        assert!(resp.headers().contains_key("allow"));
        assert_eq!(error_code(&resp.text().await?), Some("MethodNotAllowed"));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_bucket_post_without_sub_resource() -> anyhow::Result<()> {
        let bucket = test_bucket_name("post");
        let resp = client().post(url(&format!("/{bucket}"))).send().await?;
        assert_eq!(resp.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            resp.headers()
                .get("allow")
                .and_then(|v| v.to_str().ok()),
            Some("HEAD, GET, POST, PUT, DELETE")
        );
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_send_empty_body_for_head_errors() -> anyhow::Result<()> {
        let bucket = test_bucket_name("head");
        let resp = client()
            .head(url(&format!("/{bucket}/file.txt")))
            .send()
            .await?;
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_IMPLEMENTED);
        assert!(resp.bytes().await?.is_empty());
        Ok(())
    }
}
