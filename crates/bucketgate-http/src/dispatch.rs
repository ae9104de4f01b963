//! Per-request orchestration: resolve, match, gate, invoke.
//!
//! [`Dispatcher::handle`] is the single entry point the HTTP service calls.
//! It runs the domain resolver, the matcher, and the authorization gate in
//! that order, and turns every routing or gating failure into a structured
//! error response. A successful handler response is returned untouched.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bucketgate_auth::Identity;
use bucketgate_core::{BucketAddress, GatewayError, Operation, QueryParams};
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::body::GatewayBody;
use crate::domain::DomainResolver;
use crate::gate::AuthorizationGate;
use crate::matcher::{MatchOutcome, match_route, shape_of};
use crate::response::error_to_response;
use crate::table::RouteTable;

/// Per-request state carried from the service through the gate to the handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Value of the `x-amz-request-id` response header.
    pub request_id: String,
    /// Fires when the client goes away; handlers should stop work.
    pub cancel: CancellationToken,
    /// The caller, set by the gate once authorization succeeds.
    pub identity: Option<Identity>,
}

impl RequestContext {
    /// A context with no identity yet.
    #[must_use]
    pub fn new(request_id: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            request_id: request_id.into(),
            cancel,
            identity: None,
        }
    }
}

/// Operation implementations behind the gateway.
///
/// Only ever invoked after the gate has authorized the request.
///
/// # Object Safety
///
/// The returned future is boxed so the trait can be used as
/// `Arc<dyn OperationHandler>`.
pub trait OperationHandler: Send + Sync + 'static {
    /// Handle one authorized operation and produce the full HTTP response.
    fn handle_operation(
        &self,
        op: Operation,
        address: BucketAddress,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RequestContext,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<GatewayBody>, GatewayError>> + Send>>;
}

/// A handler that answers every operation with `NotImplemented`.
///
/// Lets the routing and gating layers run without a storage backend.
#[derive(Debug, Clone, Default)]
pub struct NotImplementedHandler;

impl OperationHandler for NotImplementedHandler {
    fn handle_operation(
        &self,
        op: Operation,
        _address: BucketAddress,
        _parts: http::request::Parts,
        _body: Bytes,
        _ctx: RequestContext,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<GatewayBody>, GatewayError>> + Send>>
    {
        Box::pin(async move { Err(GatewayError::not_implemented(op.as_str())) })
    }
}

/// Resolves, matches, gates and dispatches requests.
pub struct Dispatcher<H: OperationHandler + ?Sized> {
    resolver: DomainResolver,
    table: Arc<RouteTable>,
    gate: AuthorizationGate,
    handler: Arc<H>,
}

impl<H: OperationHandler + ?Sized> fmt::Debug for Dispatcher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("resolver", &self.resolver)
            .field("routes", &self.table.len())
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl<H: OperationHandler + ?Sized> Dispatcher<H> {
    /// Assemble a dispatcher.
    #[must_use]
    pub fn new(
        resolver: DomainResolver,
        table: Arc<RouteTable>,
        gate: AuthorizationGate,
        handler: Arc<H>,
    ) -> Self {
        Self {
            resolver,
            table,
            gate,
            handler,
        }
    }

    /// Handle a request whose body has not been read yet.
    ///
    /// The body is only collected once the gate has authorized the request,
    /// so a rejected upload is never buffered.
    pub async fn handle<B>(
        &self,
        req: http::Request<B>,
        ctx: RequestContext,
    ) -> http::Response<GatewayBody>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: fmt::Display,
    {
        let method = req.method().clone();
        let request_id = ctx.request_id.clone();
        match self.route(req, ctx).await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, request_id = %request_id, "request failed");
                error_to_response(&err, &request_id, &method)
            }
        }
    }

    async fn route<B>(
        &self,
        req: http::Request<B>,
        ctx: RequestContext,
    ) -> Result<http::Response<GatewayBody>, GatewayError>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: fmt::Display,
    {
        let (parts, body) = req.into_parts();
        let address = self.resolver.resolve(request_host(&parts), parts.uri.path());
        let query = QueryParams::from_uri(&parts.uri);

        let outcome = match_route(
            &self.table,
            &parts.method,
            shape_of(&address),
            &query,
            &parts.headers,
        );
        let rule = match outcome {
            MatchOutcome::Matched(m) => m.rule,
            MatchOutcome::MethodNotAllowed { allowed } => {
                warn!(
                    method = %parts.method,
                    bucket = ?address.bucket,
                    key = ?address.key,
                    request_id = %ctx.request_id,
                    "method not allowed"
                );
                return Err(GatewayError::method_not_allowed(&parts.method, &allowed)
                    .with_resource(address.resource()));
            }
            MatchOutcome::NotFound => {
                warn!(
                    method = %parts.method,
                    uri = %parts.uri,
                    request_id = %ctx.request_id,
                    "no route for request"
                );
                return Err(GatewayError::unsupported_operation(address.resource()));
            }
        };

        info!(
            operation = %rule.operation,
            bucket = ?address.bucket,
            key = ?address.key,
            mode = ?address.mode,
            request_id = %ctx.request_id,
            "routed request"
        );

        self.gate
            .call(rule, address, parts, body, ctx, self.handler.as_ref())
            .await
    }
}

/// The `Host` header, falling back to the URI authority (HTTP/2).
fn request_host(parts: &http::request::Parts) -> Option<&str> {
    parts
        .headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.authority().map(http::uri::Authority::as_str))
}
