//! Error types for credential extraction and policy evaluation.

/// Errors that make a request's credentials unusable.
///
/// Every variant is surfaced to the client as an authentication failure,
/// never as an access denial.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credentials were supplied and anonymous access is disabled.
    #[error("Missing credentials")]
    MissingCredentials,

    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The `Authorization` header names an unknown signing scheme.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The credential scope does not have the form
    /// `AKID/date/region/service/aws4_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The access key id is not known to the credential provider.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),
}

/// Failures inside a policy evaluator.
///
/// The authorization gate treats every one of these as a denial.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// A grant could not be parsed.
    #[error("invalid grant: {0}")]
    InvalidGrant(String),

    /// The grant document could not be read or decoded.
    #[error("failed to load policy: {0}")]
    Load(String),

    /// The request was cancelled before evaluation finished.
    #[error("policy evaluation cancelled")]
    Cancelled,

    /// The evaluator backend is unreachable or failed.
    #[error("policy evaluator unavailable: {0}")]
    Unavailable(String),
}
