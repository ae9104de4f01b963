//! Authorization gate integration tests.

#[cfg(test)]
mod tests {
    use crate::{client, error_code, test_bucket_name, url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_access_key() -> anyhow::Result<()> {
        let bucket = test_bucket_name("authz");
        let resp = client()
            .get(url(&format!("/{bucket}/file.txt")))
            .header("authorization", "AWS NOBODY:c2lnbmF0dXJl")
            .send()
            .await?;

        assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);
        assert_eq!(error_code(&resp.text().await?), Some("InvalidAccessKeyId"));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_malformed_sigv4_scope() -> anyhow::Result<()> {
        let bucket = test_bucket_name("scope");
        let resp = client()
            .get(url(&format!("/{bucket}")))
            .header(
                "authorization",
                "AWS4-HMAC-SHA256 Credential=AKID/20240101, Signature=abc",
            )
            .send()
            .await?;

        assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);
        assert_eq!(error_code(&resp.text().await?), Some("InvalidAccessKeyId"));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_admit_anonymous_caller_under_default_policy() -> anyhow::Result<()> {
        let bucket = test_bucket_name("anon");
        let resp = client()
            .get(url(&format!("/{bucket}?list-type=2")))
            .send()
            .await?;

        assert_eq!(resp.status(), reqwest::StatusCode::NOT_IMPLEMENTED);
        let body = resp.text().await?;
        assert_eq!(error_code(&body), Some("NotImplemented"));
        assert!(body.contains("ListObjectsV2"));
        Ok(())
    }
}
