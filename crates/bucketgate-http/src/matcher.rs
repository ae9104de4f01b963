//! Route matching: method + path shape + query + headers to one route rule.
//!
//! Rules of the request's method are evaluated strictly in table order and the
//! first fully satisfied rule wins, so the result never depends on map
//! iteration order or on the order of the request's query parameters. When no
//! rule of the method matches, rules of other methods are consulted only to
//! tell [`MatchOutcome::MethodNotAllowed`] apart from
//! [`MatchOutcome::NotFound`].

use bucketgate_core::{BucketAddress, QueryParams};
use http::{HeaderMap, Method};

use crate::table::{HeaderPredicate, PathShape, QueryPredicate, RouteRule, RouteTable};

/// The path shape of a resolved address.
#[must_use]
pub fn shape_of(address: &BucketAddress) -> PathShape {
    match (&address.bucket, &address.key) {
        (None, _) => PathShape::Service,
        (Some(_), None) => PathShape::Bucket,
        (Some(_), Some(_)) => PathShape::Object,
    }
}

/// A selected rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The winning rule.
    pub rule: &'a RouteRule,
    /// Index of the satisfied alternate predicate set, if the rule has any.
    pub alternate: Option<usize>,
}

/// Result of matching a request against a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    /// A rule of the request's method matched.
    Matched(RouteMatch<'a>),
    /// The path shape is served by other methods, or by the request's own
    /// method only under predicates the request does not satisfy.
    MethodNotAllowed {
        /// Every method with a rule of the same path shape, in table order.
        allowed: Vec<Method>,
    },
    /// No rule of any method has this path shape.
    NotFound,
}

/// Select the rule for a request.
#[must_use]
pub fn match_route<'a>(
    table: &'a RouteTable,
    method: &Method,
    shape: PathShape,
    query: &QueryParams,
    headers: &HeaderMap,
) -> MatchOutcome<'a> {
    for rule in table.rules_for(method) {
        if rule.shape != shape || !headers_satisfied(&rule.headers, headers) {
            continue;
        }
        if rule.alternates.is_empty() {
            return MatchOutcome::Matched(RouteMatch {
                rule,
                alternate: None,
            });
        }
        if let Some(index) = rule
            .alternates
            .iter()
            .position(|set| query_satisfied(set, query))
        {
            return MatchOutcome::Matched(RouteMatch {
                rule,
                alternate: Some(index),
            });
        }
    }

    let allowed: Vec<Method> = table
        .methods()
        .filter(|m| table.rules_for(m).iter().any(|r| r.shape == shape))
        .cloned()
        .collect();

    if allowed.iter().all(|m| m == method) {
        MatchOutcome::NotFound
    } else {
        MatchOutcome::MethodNotAllowed { allowed }
    }
}

fn query_satisfied(predicates: &[QueryPredicate], query: &QueryParams) -> bool {
    predicates.iter().all(|p| {
        query
            .get(p.key)
            .is_some_and(|value| p.pattern.matches(value))
    })
}

fn headers_satisfied(predicates: &[HeaderPredicate], headers: &HeaderMap) -> bool {
    predicates.iter().all(|p| {
        headers
            .get(p.name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|value| p.pattern.matches(value))
    })
}

#[cfg(test)]
mod tests {
    use bucketgate_core::{Action, Operation};

    use super::*;
    use crate::table::{COPY_SOURCE_HEADER, present};

    fn operation_for(method: &Method, shape: PathShape, query: &str) -> Option<Operation> {
        operation_with_headers(method, shape, query, &HeaderMap::new())
    }

    fn operation_with_headers(
        method: &Method,
        shape: PathShape,
        query: &str,
        headers: &HeaderMap,
    ) -> Option<Operation> {
        let table = RouteTable::standard();
        match match_route(&table, method, shape, &QueryParams::parse(query), headers) {
            MatchOutcome::Matched(m) => Some(m.rule.operation),
            _ => None,
        }
    }

    fn copy_source(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COPY_SOURCE_HEADER, value.parse().expect("valid header"));
        headers
    }

    // --- GET object ---

    #[test]
    fn test_should_select_plain_get_object_without_query() {
        assert_eq!(
            operation_for(&Method::GET, PathShape::Object, ""),
            Some(Operation::GetObject)
        );
    }

    #[test]
    fn test_should_select_plain_get_object_with_extraneous_query() {
        let table = RouteTable::standard();
        let outcome = match_route(
            &table,
            &Method::GET,
            PathShape::Object,
            &QueryParams::parse("response-content-type=text%2Fplain&X-Amz-Signature=abc"),
            &HeaderMap::new(),
        );
        let MatchOutcome::Matched(m) = outcome else {
            panic!("expected a match, got {outcome:?}");
        };
        assert_eq!(m.rule.operation, Operation::GetObject);
        assert!(m.rule.alternates.is_empty(), "plain rule expected");
        assert_eq!(m.alternate, None);
    }

    #[test]
    fn test_should_select_get_object_tagging() {
        assert_eq!(
            operation_for(&Method::GET, PathShape::Object, "tagging="),
            Some(Operation::GetObjectTagging)
        );
    }

    #[test]
    fn test_should_select_presigned_v2_alternate() {
        let table = RouteTable::standard();
        let outcome = match_route(
            &table,
            &Method::GET,
            PathShape::Object,
            &QueryParams::parse("AWSAccessKeyId=AKID&Expires=1700000000&Signature=abc%3D"),
            &HeaderMap::new(),
        );
        let MatchOutcome::Matched(m) = outcome else {
            panic!("expected a match, got {outcome:?}");
        };
        assert_eq!(m.rule.operation, Operation::GetObject);
        assert_eq!(m.alternate, Some(0));
    }

    #[test]
    fn test_should_select_presigned_v4_alternate() {
        let table = RouteTable::standard();
        let query = QueryParams::parse(
            "X-Amz-Algorithm=AWS4-HMAC-SHA256\
             &X-Amz-Credential=AKID%2F20240101%2Fus-east-1%2Fs3%2Faws4_request\
             &X-Amz-Date=20240101T000000Z&X-Amz-Expires=3600\
             &X-Amz-SignedHeaders=host&X-Amz-Signature=abc",
        );
        let outcome = match_route(&table, &Method::GET, PathShape::Object, &query, &HeaderMap::new());
        let MatchOutcome::Matched(m) = outcome else {
            panic!("expected a match, got {outcome:?}");
        };
        assert_eq!(m.rule.operation, Operation::GetObject);
        assert_eq!(m.alternate, Some(1));
    }

    #[test]
    fn test_should_prefer_presigned_over_tagging() {
        let table = RouteTable::standard();
        let query =
            QueryParams::parse("tagging&AWSAccessKeyId=AKID&Expires=1700000000&Signature=abc");
        let outcome = match_route(&table, &Method::GET, PathShape::Object, &query, &HeaderMap::new());
        assert!(matches!(
            outcome,
            MatchOutcome::Matched(RouteMatch { alternate: Some(0), .. })
        ));
    }

    #[test]
    fn test_should_reject_non_numeric_presigned_expiry() {
        assert_eq!(
            operation_for(
                &Method::GET,
                PathShape::Object,
                "AWSAccessKeyId=AKID&Expires=soon&Signature=abc&tagging"
            ),
            Some(Operation::GetObjectTagging)
        );
    }

    #[test]
    fn test_should_select_xattr_get_before_xattr_list() {
        assert_eq!(
            operation_for(&Method::GET, PathShape::Object, "xattr&key=user.color"),
            Some(Operation::GetObjectXAttr)
        );
        assert_eq!(
            operation_for(&Method::GET, PathShape::Object, "xattr&key="),
            Some(Operation::ListObjectXAttrs)
        );
        assert_eq!(
            operation_for(&Method::GET, PathShape::Object, "acl"),
            Some(Operation::GetObjectAcl)
        );
    }

    // --- GET bucket / service ---

    #[test]
    fn test_should_fall_through_to_list_objects_v1() {
        assert_eq!(
            operation_for(&Method::GET, PathShape::Bucket, ""),
            Some(Operation::ListObjects)
        );
        assert_eq!(
            operation_for(&Method::GET, PathShape::Bucket, "list-type=1&prefix=a"),
            Some(Operation::ListObjects)
        );
    }

    #[test]
    fn test_should_select_bucket_sub_resources() {
        let cases = [
            ("list-type=2", Operation::ListObjectsV2),
            ("uploads", Operation::ListMultipartUploads),
            ("uploadId=", Operation::ListParts),
            ("location", Operation::GetBucketLocation),
            ("policy", Operation::GetBucketPolicy),
            ("acl", Operation::GetBucketAcl),
        ];
        for (query, expected) in cases {
            assert_eq!(
                operation_for(&Method::GET, PathShape::Bucket, query),
                Some(expected),
                "query {query}"
            );
        }
    }

    #[test]
    fn test_should_select_list_buckets_at_service_root() {
        assert_eq!(
            operation_for(&Method::GET, PathShape::Service, ""),
            Some(Operation::ListBuckets)
        );
    }

    // --- PUT / POST / DELETE / HEAD ---

    #[test]
    fn test_should_select_copy_object_only_with_path_like_copy_source() {
        assert_eq!(
            operation_with_headers(&Method::PUT, PathShape::Object, "", &copy_source("/src/key")),
            Some(Operation::CopyObject)
        );
        assert_eq!(
            operation_with_headers(&Method::PUT, PathShape::Object, "", &copy_source("src%2Fkey")),
            Some(Operation::CopyObject)
        );
        assert_eq!(
            operation_with_headers(&Method::PUT, PathShape::Object, "", &copy_source("src")),
            Some(Operation::PutObject)
        );
        assert_eq!(
            operation_for(&Method::PUT, PathShape::Object, ""),
            Some(Operation::PutObject)
        );
    }

    #[test]
    fn test_should_select_upload_part_before_copy() {
        assert_eq!(
            operation_with_headers(
                &Method::PUT,
                PathShape::Object,
                "partNumber=3&uploadId=abc",
                &copy_source("/src/key")
            ),
            Some(Operation::UploadPart)
        );
        assert_eq!(
            operation_for(&Method::PUT, PathShape::Object, "partNumber=x&uploadId=abc"),
            Some(Operation::PutObject)
        );
    }

    #[test]
    fn test_should_select_object_put_sub_resources() {
        assert_eq!(
            operation_for(&Method::PUT, PathShape::Object, "tagging"),
            Some(Operation::PutObjectTagging)
        );
        assert_eq!(
            operation_for(&Method::PUT, PathShape::Object, "xattr"),
            Some(Operation::PutObjectXAttr)
        );
        assert_eq!(
            operation_for(&Method::PUT, PathShape::Object, "acl"),
            Some(Operation::PutObjectAcl)
        );
        assert_eq!(
            operation_for(&Method::PUT, PathShape::Bucket, "acl"),
            Some(Operation::PutBucketAcl)
        );
        assert_eq!(
            operation_for(&Method::PUT, PathShape::Bucket, "policy"),
            Some(Operation::PutBucketPolicy)
        );
    }

    #[test]
    fn test_should_select_multipart_posts() {
        assert_eq!(
            operation_for(&Method::POST, PathShape::Object, "uploads"),
            Some(Operation::CreateMultipartUpload)
        );
        assert_eq!(
            operation_for(&Method::POST, PathShape::Object, "uploadId=abc"),
            Some(Operation::CompleteMultipartUpload)
        );
        assert_eq!(
            operation_for(&Method::POST, PathShape::Bucket, "delete"),
            Some(Operation::DeleteObjects)
        );
    }

    #[test]
    fn test_should_select_deletes() {
        let cases = [
            ("uploadId=abc", Operation::AbortMultipartUpload),
            ("tagging", Operation::DeleteObjectTagging),
            ("xattr&key=user.color", Operation::DeleteObjectXAttr),
            ("xattr", Operation::DeleteObject),
            ("", Operation::DeleteObject),
        ];
        for (query, expected) in cases {
            assert_eq!(
                operation_for(&Method::DELETE, PathShape::Object, query),
                Some(expected),
                "query {query}"
            );
        }
        assert_eq!(
            operation_for(&Method::DELETE, PathShape::Bucket, "policy"),
            Some(Operation::DeleteBucketPolicy)
        );
    }

    #[test]
    fn test_should_select_heads() {
        assert_eq!(
            operation_for(&Method::HEAD, PathShape::Object, ""),
            Some(Operation::HeadObject)
        );
        assert_eq!(
            operation_for(&Method::HEAD, PathShape::Bucket, "acl"),
            Some(Operation::HeadBucket)
        );
    }

    // --- Misses ---

    #[test]
    fn test_should_report_method_not_allowed_for_unknown_method_on_object() {
        let table = RouteTable::standard();
        let outcome = match_route(
            &table,
            &Method::PATCH,
            PathShape::Object,
            &QueryParams::default(),
            &HeaderMap::new(),
        );
        assert_eq!(
            outcome,
            MatchOutcome::MethodNotAllowed {
                allowed: vec![Method::HEAD, Method::GET, Method::POST, Method::PUT, Method::DELETE],
            }
        );
    }

    #[test]
    fn test_should_report_method_not_allowed_when_predicates_fail() {
        let table = RouteTable::standard();
        let outcome = match_route(
            &table,
            &Method::POST,
            PathShape::Bucket,
            &QueryParams::default(),
            &HeaderMap::new(),
        );
        assert_eq!(
            outcome,
            MatchOutcome::MethodNotAllowed {
                allowed: vec![Method::HEAD, Method::GET, Method::POST, Method::PUT, Method::DELETE],
            }
        );
    }

    #[test]
    fn test_should_leave_unserved_method_out_of_allowed_list() {
        let table = RouteTable::standard();
        let outcome = match_route(
            &table,
            &Method::POST,
            PathShape::Service,
            &QueryParams::default(),
            &HeaderMap::new(),
        );
        assert_eq!(
            outcome,
            MatchOutcome::MethodNotAllowed {
                allowed: vec![Method::GET],
            }
        );
    }

    #[test]
    fn test_should_report_not_found_when_no_method_serves_shape() {
        let table = RouteTable::new([RouteRule::new(
            Method::GET,
            PathShape::Object,
            Operation::GetObjectTagging,
            &[Action::GetObject],
        )
        .query(&[present("tagging")])])
        .expect("valid table");

        let outcome = match_route(
            &table,
            &Method::GET,
            PathShape::Bucket,
            &QueryParams::default(),
            &HeaderMap::new(),
        );
        assert_eq!(outcome, MatchOutcome::NotFound);

        let outcome = match_route(
            &table,
            &Method::GET,
            PathShape::Object,
            &QueryParams::default(),
            &HeaderMap::new(),
        );
        assert_eq!(outcome, MatchOutcome::NotFound);
    }

    #[test]
    fn test_should_be_deterministic_across_repeated_matches() {
        let table = RouteTable::standard();
        let query = QueryParams::parse("acl&tagging&uploads");
        let first = match_route(&table, &Method::GET, PathShape::Object, &query, &HeaderMap::new());
        for _ in 0..10 {
            let again =
                match_route(&table, &Method::GET, PathShape::Object, &query, &HeaderMap::new());
            assert_eq!(first, again);
        }
        let reordered = QueryParams::parse("uploads&tagging&acl");
        let outcome =
            match_route(&table, &Method::GET, PathShape::Object, &reordered, &HeaderMap::new());
        assert_eq!(first, outcome);
    }
}
