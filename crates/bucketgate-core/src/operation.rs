//! The logical storage operations a request can be routed to.

use std::fmt;

/// A logical storage operation.
///
/// Each variant corresponds to one handler. Several route rules may resolve to
/// the same operation (plain and pre-signed `GetObject`, for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Object metadata without the body.
    HeadObject,
    /// Bucket existence and access check.
    HeadBucket,
    /// Object body, plain or via a pre-signed URL.
    GetObject,
    /// Object tag set.
    GetObjectTagging,
    /// One extended attribute of an object.
    GetObjectXAttr,
    /// All extended attribute names of an object.
    ListObjectXAttrs,
    /// Object access control list.
    GetObjectAcl,
    /// Object listing, version 1.
    ListObjects,
    /// Object listing, version 2 (`list-type=2`).
    ListObjectsV2,
    /// In-progress multipart uploads of a bucket.
    ListMultipartUploads,
    /// Uploaded parts of one multipart upload.
    ListParts,
    /// Bucket region.
    GetBucketLocation,
    /// Bucket policy document.
    GetBucketPolicy,
    /// Bucket access control list.
    GetBucketAcl,
    /// Start a multipart upload.
    CreateMultipartUpload,
    /// Assemble the uploaded parts into an object.
    CompleteMultipartUpload,
    /// Batch object removal.
    DeleteObjects,
    /// Upload one part of a multipart upload.
    UploadPart,
    /// Server-side copy selected by the `x-amz-copy-source` header.
    CopyObject,
    /// Object upload.
    PutObject,
    /// Replace an object tag set.
    PutObjectTagging,
    /// Set extended attributes of an object.
    PutObjectXAttr,
    /// Replace an object access control list.
    PutObjectAcl,
    /// Replace a bucket access control list.
    PutBucketAcl,
    /// Replace a bucket policy document.
    PutBucketPolicy,
    /// Abandon a multipart upload.
    AbortMultipartUpload,
    /// Remove an object tag set.
    DeleteObjectTagging,
    /// Remove one extended attribute of an object.
    DeleteObjectXAttr,
    /// Object removal.
    DeleteObject,
    /// Remove a bucket policy document.
    DeleteBucketPolicy,
    /// Buckets owned by the caller.
    ListBuckets,
}

impl Operation {
    /// Returns the operation name as used in logs and error resources.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeadObject => "HeadObject",
            Self::HeadBucket => "HeadBucket",
            Self::GetObject => "GetObject",
            Self::GetObjectTagging => "GetObjectTagging",
            Self::GetObjectXAttr => "GetObjectXAttr",
            Self::ListObjectXAttrs => "ListObjectXAttrs",
            Self::GetObjectAcl => "GetObjectAcl",
            Self::ListObjects => "ListObjects",
            Self::ListObjectsV2 => "ListObjectsV2",
            Self::ListMultipartUploads => "ListMultipartUploads",
            Self::ListParts => "ListParts",
            Self::GetBucketLocation => "GetBucketLocation",
            Self::GetBucketPolicy => "GetBucketPolicy",
            Self::GetBucketAcl => "GetBucketAcl",
            Self::CreateMultipartUpload => "CreateMultipartUpload",
            Self::CompleteMultipartUpload => "CompleteMultipartUpload",
            Self::DeleteObjects => "DeleteObjects",
            Self::UploadPart => "UploadPart",
            Self::CopyObject => "CopyObject",
            Self::PutObject => "PutObject",
            Self::PutObjectTagging => "PutObjectTagging",
            Self::PutObjectXAttr => "PutObjectXAttr",
            Self::PutObjectAcl => "PutObjectAcl",
            Self::PutBucketAcl => "PutBucketAcl",
            Self::PutBucketPolicy => "PutBucketPolicy",
            Self::AbortMultipartUpload => "AbortMultipartUpload",
            Self::DeleteObjectTagging => "DeleteObjectTagging",
            Self::DeleteObjectXAttr => "DeleteObjectXAttr",
            Self::DeleteObject => "DeleteObject",
            Self::DeleteBucketPolicy => "DeleteBucketPolicy",
            Self::ListBuckets => "ListBuckets",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
