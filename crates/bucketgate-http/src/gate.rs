//! The authorization gate between a matched rule and its handler.
//!
//! ```text
//! Matched -> extract credentials -> InvalidAccessKeyId
//!                                -> evaluate(identity, resource, actions) -> AccessDenied
//!                                                                         -> read body -> handler
//! ```
//!
//! An evaluator failure is a denial. The gate owns no mutable state: every
//! call is independent, and the evaluator may take as long as it needs
//! without anything being locked.

use std::fmt;
use std::sync::Arc;

use bucketgate_auth::{CredentialExtractor, Decision, Identity, PolicyEvaluator};
use bucketgate_core::{BucketAddress, GatewayError};
use bytes::Bytes;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::body::GatewayBody;
use crate::dispatch::{OperationHandler, RequestContext};
use crate::table::RouteRule;

/// Wraps handler invocation with a rule's required actions.
#[derive(Clone)]
pub struct AuthorizationGate {
    extractor: Arc<dyn CredentialExtractor>,
    evaluator: Arc<dyn PolicyEvaluator>,
}

impl fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationGate").finish_non_exhaustive()
    }
}

impl AuthorizationGate {
    /// Create a gate over the given collaborators.
    #[must_use]
    pub fn new(
        extractor: Arc<dyn CredentialExtractor>,
        evaluator: Arc<dyn PolicyEvaluator>,
    ) -> Self {
        Self {
            extractor,
            evaluator,
        }
    }

    /// Authenticate the caller and check every action `rule` requires.
    ///
    /// # Errors
    ///
    /// `InvalidAccessKeyId` when credential extraction fails; `AccessDenied`
    /// when the evaluator denies or fails.
    pub async fn authorize(
        &self,
        rule: &RouteRule,
        address: &BucketAddress,
        parts: &http::request::Parts,
        cancel: &CancellationToken,
    ) -> Result<Identity, GatewayError> {
        let identity = match self.extractor.extract(parts).await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(operation = %rule.operation, error = %err, "credential extraction failed");
                let message = err.to_string();
                return Err(GatewayError::invalid_credentials(message).with_source(err));
            }
        };

        let resource = address.resource();
        let decision = match self
            .evaluator
            .evaluate(&identity, &resource, &rule.actions, cancel)
            .await
        {
            Ok(decision) => decision,
            Err(err) => {
                warn!(
                    operation = %rule.operation,
                    %identity,
                    resource = %resource,
                    error = %err,
                    "policy evaluation failed, denying"
                );
                Decision::Denied
            }
        };

        match decision {
            Decision::Authorized => {
                debug!(operation = %rule.operation, %identity, resource = %resource, "authorized");
                Ok(identity)
            }
            Decision::Denied => {
                info!(
                    operation = %rule.operation,
                    %identity,
                    resource = %resource,
                    actions = ?rule.actions,
                    "access denied"
                );
                Err(GatewayError::access_denied(resource))
            }
        }
    }

    /// Authorize, read the request body, then invoke `handler` for the
    /// rule's operation.
    ///
    /// The body is not polled unless authorization succeeds. The handler
    /// receives the caller identity and the request's cancellation token
    /// through `ctx`.
    ///
    /// # Errors
    ///
    /// The authorization errors of [`authorize`](Self::authorize),
    /// `InternalError` when the body cannot be read, or the handler's error.
    pub async fn call<H, B>(
        &self,
        rule: &RouteRule,
        address: BucketAddress,
        parts: http::request::Parts,
        body: B,
        mut ctx: RequestContext,
        handler: &H,
    ) -> Result<http::Response<GatewayBody>, GatewayError>
    where
        H: OperationHandler + ?Sized,
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: fmt::Display,
    {
        let identity = self.authorize(rule, &address, &parts, &ctx.cancel).await?;
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                error!(
                    operation = %rule.operation,
                    request_id = %ctx.request_id,
                    error = %err,
                    "failed to collect request body"
                );
                return Err(GatewayError::internal_error("Failed to read request body"));
            }
        };
        ctx.identity = Some(identity);
        debug!(operation = %rule.operation, request_id = %ctx.request_id, "dispatching operation");
        handler
            .handle_operation(rule.operation, address, parts, body, ctx)
            .await
    }
}
