//! Integration tests for the BucketGate server.
//!
//! These tests require a running server at `localhost:17410` started with
//! its default configuration (no credentials, no policy file). They are
//! marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p bucketgate-integration -- --ignored
//! ```

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("BUCKETGATE_ENDPOINT_URL")
        .unwrap_or_else(|_| "http://localhost:17410".to_owned())
}

/// An HTTP client for talking to the gateway.
#[must_use]
pub fn client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Absolute URL for a path on the gateway.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", endpoint_url())
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Value of `<Code>` in an error document, if any.
#[must_use]
pub fn error_code(body: &str) -> Option<&str> {
    let start = body.find("<Code>")? + "<Code>".len();
    let end = body[start..].find("</Code>")? + start;
    Some(&body[start..end])
}

mod test_auth;
mod test_routing;
