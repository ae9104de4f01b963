//! Permission tokens and resolved request addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named permission that must be granted before an operation may run.
///
/// Actions render as `s3:<Name>`, the form used by policy documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Action {
    /// Read an object or its sub-resources.
    GetObject,
    /// Write an object, a part, or an object sub-resource.
    PutObject,
    /// Remove an object.
    DeleteObject,
    /// Enumerate buckets or the objects of a bucket.
    ListBucket,
    /// Enumerate in-progress multipart uploads and their parts.
    ListMultipartUploadParts,
    /// Abandon an in-progress multipart upload.
    AbortMultipartUpload,
    /// Read the region a bucket lives in.
    GetBucketLocation,
    /// Read the bucket policy document.
    GetBucketPolicy,
    /// Replace the bucket policy document.
    PutBucketPolicy,
    /// Remove the bucket policy document.
    DeleteBucketPolicy,
    /// Read the bucket access control list.
    GetBucketAcl,
    /// Replace the bucket access control list.
    PutBucketAcl,
    /// Read an object access control list.
    GetObjectAcl,
    /// Replace an object access control list.
    PutObjectAcl,
}

impl Action {
    /// Every action, in declaration order.
    pub const ALL: [Action; 14] = [
        Self::GetObject,
        Self::PutObject,
        Self::DeleteObject,
        Self::ListBucket,
        Self::ListMultipartUploadParts,
        Self::AbortMultipartUpload,
        Self::GetBucketLocation,
        Self::GetBucketPolicy,
        Self::PutBucketPolicy,
        Self::DeleteBucketPolicy,
        Self::GetBucketAcl,
        Self::PutBucketAcl,
        Self::GetObjectAcl,
        Self::PutObjectAcl,
    ];

    /// Returns the policy-document name of this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetObject => "s3:GetObject",
            Self::PutObject => "s3:PutObject",
            Self::DeleteObject => "s3:DeleteObject",
            Self::ListBucket => "s3:ListBucket",
            Self::ListMultipartUploadParts => "s3:ListMultipartUploadParts",
            Self::AbortMultipartUpload => "s3:AbortMultipartUpload",
            Self::GetBucketLocation => "s3:GetBucketLocation",
            Self::GetBucketPolicy => "s3:GetBucketPolicy",
            Self::PutBucketPolicy => "s3:PutBucketPolicy",
            Self::DeleteBucketPolicy => "s3:DeleteBucketPolicy",
            Self::GetBucketAcl => "s3:GetBucketAcl",
            Self::PutBucketAcl => "s3:PutBucketAcl",
            Self::GetObjectAcl => "s3:GetObjectAcl",
            Self::PutObjectAcl => "s3:PutObjectAcl",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ParseActionError(s.to_owned()))
    }
}

impl TryFrom<String> for Action {
    type Error = ParseActionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_owned()
    }
}

/// How the bucket name was encoded in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// Bucket taken from the `Host` header (`bucket.domain`).
    VirtualHosted,
    /// Bucket taken from the first path segment (`/bucket/key`).
    PathStyle,
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VirtualHosted => f.write_str("virtual-hosted"),
            Self::PathStyle => f.write_str("path-style"),
        }
    }
}

/// The bucket and object a request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketAddress {
    /// Bucket name; `None` only for a path-style request to the service root.
    pub bucket: Option<String>,
    /// Percent-decoded object key; may contain `/`.
    pub key: Option<String>,
    /// How the bucket was resolved.
    pub mode: AddressingMode,
}

impl BucketAddress {
    /// The policy resource string: empty, `bucket`, or `bucket/key`.
    #[must_use]
    pub fn resource(&self) -> String {
        match (&self.bucket, &self.key) {
            (Some(bucket), Some(key)) => format!("{bucket}/{key}"),
            (Some(bucket), None) => bucket.clone(),
            (None, _) => String::new(),
        }
    }
}
