//! The route table: an immutable, priority-ordered catalog of route rules.
//!
//! Every addressable operation is one [`RouteRule`] value. Rules are grouped
//! by HTTP method and kept in the order they were declared; the matcher takes
//! the first rule of the request's method whose predicates are all satisfied.
//! Rules with more specific predicates are therefore declared before the
//! plain rule sharing their path shape (`?tagging` before plain `GetObject`).
//!
//! [`RouteTable::standard`] builds the gateway's fixed catalog once at
//! startup. [`RouteTable::new`] accepts an arbitrary list, which tests use to
//! exercise the matcher against small tables.

use std::fmt;

use bucketgate_core::{Action, GatewayError, Operation};
use http::Method;
use tracing::error;

/// Header carrying the source of a server-side copy.
pub const COPY_SOURCE_HEADER: &str = "x-amz-copy-source";

/// What the path must look like after bucket resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathShape {
    /// No bucket: the service root.
    Service,
    /// A bucket with no further path.
    Bucket,
    /// A bucket and a non-empty object key.
    Object,
}

impl fmt::Display for PathShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => f.write_str("service"),
            Self::Bucket => f.write_str("bucket"),
            Self::Object => f.write_str("object"),
        }
    }
}

/// Constraint on a query-parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePattern {
    /// Any value, including empty (`?tagging`, `?uploadId=`).
    Any,
    /// Any non-empty value.
    NonEmpty,
    /// One or more ASCII digits.
    Digits,
    /// Exactly this value.
    Exact(&'static str),
}

impl ValuePattern {
    /// Whether `value` conforms to this pattern.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::NonEmpty => !value.is_empty(),
            Self::Digits => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
            Self::Exact(expected) => value == *expected,
        }
    }
}

/// A required query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPredicate {
    /// Parameter name.
    pub key: &'static str,
    /// Constraint on its value.
    pub pattern: ValuePattern,
}

/// Constraint on a header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPattern {
    /// The value contains a `/`, raw or percent-encoded as `%2F`.
    ContainsPathSeparator,
}

impl HeaderPattern {
    /// Whether `value` conforms to this pattern.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::ContainsPathSeparator => {
                value.contains('/') || value.to_ascii_uppercase().contains("%2F")
            }
        }
    }
}

/// A required request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderPredicate {
    /// Lowercase header name.
    pub name: &'static str,
    /// Constraint on its value.
    pub pattern: HeaderPattern,
}

/// Shorthand for a presence-only query predicate.
#[must_use]
pub const fn present(key: &'static str) -> QueryPredicate {
    QueryPredicate {
        key,
        pattern: ValuePattern::Any,
    }
}

/// Shorthand for a query predicate with a value pattern.
#[must_use]
pub const fn valued(key: &'static str, pattern: ValuePattern) -> QueryPredicate {
    QueryPredicate { key, pattern }
}

/// One addressable operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    /// HTTP method.
    pub method: Method,
    /// Path shape.
    pub shape: PathShape,
    /// Alternate query predicate sets, tried in order; empty means unconstrained.
    pub alternates: Vec<Vec<QueryPredicate>>,
    /// Header predicates, all required.
    pub headers: Vec<HeaderPredicate>,
    /// Permissions that must all be granted.
    pub actions: Vec<Action>,
    /// The handler this rule dispatches to.
    pub operation: Operation,
}

impl RouteRule {
    /// A rule with no predicates.
    #[must_use]
    pub fn new(method: Method, shape: PathShape, operation: Operation, actions: &[Action]) -> Self {
        Self {
            method,
            shape,
            alternates: Vec::new(),
            headers: Vec::new(),
            actions: actions.to_vec(),
            operation,
        }
    }

    /// Add an alternate set of query predicates.
    #[must_use]
    pub fn query(mut self, predicates: &[QueryPredicate]) -> Self {
        self.alternates.push(predicates.to_vec());
        self
    }

    /// Require a header whose value matches `pattern`.
    #[must_use]
    pub fn header(mut self, name: &'static str, pattern: HeaderPattern) -> Self {
        self.headers.push(HeaderPredicate { name, pattern });
        self
    }
}

/// The rules of one method, in priority order.
#[derive(Debug, Clone)]
struct MethodRules {
    method: Method,
    rules: Vec<RouteRule>,
}

/// An immutable catalog of route rules grouped by method.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    methods: Vec<MethodRules>,
}

impl RouteTable {
    /// Build a table from rules in priority order.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a rule requires no actions; every route
    /// must be gated.
    pub fn new(rules: impl IntoIterator<Item = RouteRule>) -> Result<Self, GatewayError> {
        let rules: Vec<RouteRule> = rules.into_iter().collect();
        if let Some(rule) = rules.iter().find(|r| r.actions.is_empty()) {
            error!(operation = %rule.operation, method = %rule.method, "route rule without required actions");
            return Err(GatewayError::internal_error(format!(
                "route {} {} has no required actions",
                rule.method, rule.operation
            )));
        }
        Ok(Self::grouped(rules))
    }

    /// The gateway's fixed route catalog.
    #[must_use]
    pub fn standard() -> Self {
        Self::grouped(standard_rules())
    }

    fn grouped(rules: Vec<RouteRule>) -> Self {
        let mut methods: Vec<MethodRules> = Vec::new();
        for rule in rules {
            match methods.iter_mut().find(|m| m.method == rule.method) {
                Some(group) => group.rules.push(rule),
                None => methods.push(MethodRules {
                    method: rule.method.clone(),
                    rules: vec![rule],
                }),
            }
        }
        Self { methods }
    }

    /// Rules of `method` in priority order; empty for unknown methods.
    #[must_use]
    pub fn rules_for(&self, method: &Method) -> &[RouteRule] {
        self.methods
            .iter()
            .find(|m| m.method == *method)
            .map(|m| m.rules.as_slice())
            .unwrap_or_default()
    }

    /// Methods with at least one rule, in first-declared order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().map(|m| &m.method)
    }

    /// Total number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.iter().map(|m| m.rules.len()).sum()
    }

    /// Whether the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// The fixed catalog, per method, most specific rule first.
#[allow(clippy::too_many_lines)]
fn standard_rules() -> Vec<RouteRule> {
    use Operation as Op;
    use PathShape::{Bucket, Object, Service};
    use ValuePattern::{Digits, Exact, NonEmpty};

    vec![
        // HEAD
        RouteRule::new(Method::HEAD, Object, Op::HeadObject, &[Action::GetObject]),
        RouteRule::new(Method::HEAD, Bucket, Op::HeadBucket, &[Action::ListBucket]),
        // GET, object level. Pre-signed URLs come first so their signature
        // parameters are never mistaken for a sub-resource request. A
        // pre-signed fetch is gated on the bucket listing permission.
        RouteRule::new(Method::GET, Object, Op::GetObject, &[Action::ListBucket])
            .query(&[
                valued("AWSAccessKeyId", NonEmpty),
                valued("Expires", Digits),
                valued("Signature", NonEmpty),
            ])
            .query(&[
                valued("X-Amz-Credential", NonEmpty),
                valued("X-Amz-Algorithm", NonEmpty),
                valued("X-Amz-Signature", NonEmpty),
                valued("X-Amz-Date", NonEmpty),
                valued("X-Amz-SignedHeaders", NonEmpty),
                valued("X-Amz-Expires", Digits),
            ]),
        RouteRule::new(Method::GET, Object, Op::GetObjectTagging, &[Action::GetBucketPolicy])
            .query(&[present("tagging")]),
        RouteRule::new(Method::GET, Object, Op::GetObjectXAttr, &[Action::GetObject])
            .query(&[present("xattr"), valued("key", NonEmpty)]),
        RouteRule::new(Method::GET, Object, Op::ListObjectXAttrs, &[Action::GetObject])
            .query(&[present("xattr")]),
        RouteRule::new(Method::GET, Object, Op::GetObjectAcl, &[Action::GetObjectAcl])
            .query(&[present("acl")]),
        RouteRule::new(Method::GET, Object, Op::GetObject, &[Action::GetObject]),
        // GET, bucket level
        RouteRule::new(Method::GET, Bucket, Op::ListObjectsV2, &[Action::ListBucket])
            .query(&[valued("list-type", Exact("2"))]),
        RouteRule::new(
            Method::GET,
            Bucket,
            Op::ListMultipartUploads,
            &[Action::ListMultipartUploadParts],
        )
        .query(&[present("uploads")]),
        RouteRule::new(Method::GET, Bucket, Op::ListParts, &[Action::ListMultipartUploadParts])
            .query(&[present("uploadId")]),
        RouteRule::new(Method::GET, Bucket, Op::GetBucketLocation, &[Action::GetBucketLocation])
            .query(&[present("location")]),
        RouteRule::new(Method::GET, Bucket, Op::GetBucketPolicy, &[Action::GetBucketPolicy])
            .query(&[present("policy")]),
        RouteRule::new(Method::GET, Bucket, Op::GetBucketAcl, &[Action::GetBucketAcl])
            .query(&[present("acl")]),
        RouteRule::new(Method::GET, Bucket, Op::ListObjects, &[Action::ListBucket]),
        // GET, service root
        RouteRule::new(Method::GET, Service, Op::ListBuckets, &[Action::ListBucket]),
        // POST
        RouteRule::new(Method::POST, Object, Op::CreateMultipartUpload, &[Action::PutObject])
            .query(&[present("uploads")]),
        RouteRule::new(Method::POST, Object, Op::CompleteMultipartUpload, &[Action::PutObject])
            .query(&[present("uploadId")]),
        RouteRule::new(Method::POST, Bucket, Op::DeleteObjects, &[Action::DeleteObject])
            .query(&[present("delete")]),
        // PUT, object level
        RouteRule::new(Method::PUT, Object, Op::UploadPart, &[Action::PutObject])
            .query(&[valued("partNumber", Digits), present("uploadId")]),
        RouteRule::new(Method::PUT, Object, Op::CopyObject, &[Action::PutObject])
            .header(COPY_SOURCE_HEADER, HeaderPattern::ContainsPathSeparator),
        RouteRule::new(Method::PUT, Object, Op::PutObjectTagging, &[Action::PutBucketPolicy])
            .query(&[present("tagging")]),
        RouteRule::new(Method::PUT, Object, Op::PutObjectXAttr, &[Action::PutObject])
            .query(&[present("xattr")]),
        RouteRule::new(Method::PUT, Object, Op::PutObjectAcl, &[Action::PutObjectAcl])
            .query(&[present("acl")]),
        RouteRule::new(Method::PUT, Object, Op::PutObject, &[Action::PutObject]),
        // PUT, bucket level
        RouteRule::new(Method::PUT, Bucket, Op::PutBucketAcl, &[Action::PutBucketAcl])
            .query(&[present("acl")]),
        RouteRule::new(Method::PUT, Bucket, Op::PutBucketPolicy, &[Action::PutBucketPolicy])
            .query(&[present("policy")]),
        // DELETE, object level
        RouteRule::new(
            Method::DELETE,
            Object,
            Op::AbortMultipartUpload,
            &[Action::AbortMultipartUpload],
        )
        .query(&[present("uploadId")]),
        RouteRule::new(
            Method::DELETE,
            Object,
            Op::DeleteObjectTagging,
            &[Action::PutBucketPolicy],
        )
        .query(&[present("tagging")]),
        RouteRule::new(Method::DELETE, Object, Op::DeleteObjectXAttr, &[Action::PutObject])
            .query(&[present("xattr"), valued("key", NonEmpty)]),
        RouteRule::new(Method::DELETE, Object, Op::DeleteObject, &[Action::DeleteObject]),
        // DELETE, bucket level
        RouteRule::new(
            Method::DELETE,
            Bucket,
            Op::DeleteBucketPolicy,
            &[Action::DeleteBucketPolicy],
        )
        .query(&[present("policy")]),
    ]
}
