//! Errors returned to clients as structured S3 error responses.
//!
//! The router itself only ever produces four codes: [`UnsupportedOperation`],
//! [`MethodNotAllowed`], [`InvalidAccessKeyId`], and [`AccessDenied`]. The
//! remaining codes exist for operation handlers, which report their failures
//! through the same type.
//!
//! [`UnsupportedOperation`]: GatewayErrorCode::UnsupportedOperation
//! [`MethodNotAllowed`]: GatewayErrorCode::MethodNotAllowed
//! [`InvalidAccessKeyId`]: GatewayErrorCode::InvalidAccessKeyId
//! [`AccessDenied`]: GatewayErrorCode::AccessDenied

use std::fmt;

/// Error codes rendered in the `<Code>` element of an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum GatewayErrorCode {
    /// The policy evaluator refused, or failed to evaluate, the required actions.
    AccessDenied,
    /// The request carried credentials that could not be resolved to an identity.
    InvalidAccessKeyId,
    /// The path is served, but not under this HTTP method.
    MethodNotAllowed,
    /// The request addressed a bucket or object but matched no known operation.
    UnsupportedOperation,
    /// The request was malformed.
    InvalidRequest,
    /// The bucket does not exist.
    NoSuchBucket,
    /// The object does not exist.
    NoSuchKey,
    /// The operation has no handler implementation.
    NotImplemented,
    /// An unexpected failure inside the gateway.
    InternalError,
    /// A handler-defined code outside the standard set.
    Custom(&'static str),
}

impl GatewayErrorCode {
    /// Returns the error code as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::InvalidAccessKeyId => "InvalidAccessKeyId",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::UnsupportedOperation => "UnsupportedOperation",
            Self::InvalidRequest => "InvalidRequest",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchKey => "NoSuchKey",
            Self::NotImplemented => "NotImplemented",
            Self::InternalError => "InternalError",
            Self::Custom(s) => s,
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::AccessDenied | Self::InvalidAccessKeyId => http::StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::UnsupportedOperation | Self::NotImplemented => {
                http::StatusCode::NOT_IMPLEMENTED
            }
            Self::InvalidRequest => http::StatusCode::BAD_REQUEST,
            Self::NoSuchBucket | Self::NoSuchKey => http::StatusCode::NOT_FOUND,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::Custom(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the default message for this error.
    #[must_use]
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::AccessDenied => "Access Denied",
            Self::InvalidAccessKeyId => {
                "The AWS access key Id you provided does not exist in our records"
            }
            Self::MethodNotAllowed => "The specified method is not allowed against this resource",
            Self::UnsupportedOperation => "Operation is not supported",
            Self::InvalidRequest => "Invalid Request",
            Self::NoSuchBucket => "The specified bucket does not exist",
            Self::NoSuchKey => "The specified key does not exist",
            Self::NotImplemented => "The functionality is not implemented",
            Self::InternalError => "Internal server error",
            Self::Custom(s) => s,
        }
    }
}

impl fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured error response.
#[derive(Debug)]
pub struct GatewayError {
    /// The error code.
    pub code: GatewayErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The resource that caused the error.
    pub resource: Option<String>,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// Extra response headers (for example `Allow` on a 405).
    pub headers: Vec<(http::HeaderName, String)>,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GatewayError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl GatewayError {
    /// Create an error with the code's default message and status.
    #[must_use]
    pub fn new(code: GatewayErrorCode) -> Self {
        Self::with_message(code, code.default_message())
    }

    /// Create an error with a custom message.
    #[must_use]
    pub fn with_message(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            resource: None,
            headers: Vec::new(),
            source: None,
        }
    }

    /// Set the resource that caused this error.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attach an extra response header.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// No route of any method matches the request shape.
    #[must_use]
    pub fn unsupported_operation(resource: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::UnsupportedOperation).with_resource(resource)
    }

    /// The request shape is served only under other methods.
    ///
    /// `allowed` becomes the value of the `Allow` response header.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method, allowed: &[http::Method]) -> Self {
        let allow = allowed
            .iter()
            .map(http::Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self::with_message(
            GatewayErrorCode::MethodNotAllowed,
            format!("The specified method {method} is not allowed against this resource"),
        )
        .with_header(http::header::ALLOW, allow)
    }

    /// Credential extraction failed.
    #[must_use]
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::InvalidAccessKeyId, message)
    }

    /// The caller lacks a required permission.
    #[must_use]
    pub fn access_denied(resource: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AccessDenied).with_resource(resource)
    }

    /// The operation is recognized but has no implementation.
    #[must_use]
    pub fn not_implemented(operation: &str) -> Self {
        Self::with_message(
            GatewayErrorCode::NotImplemented,
            format!("{operation} is not implemented"),
        )
    }

    /// An internal failure.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::InternalError, message)
    }
}
