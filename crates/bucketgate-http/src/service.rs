//! The hyper `Service` in front of the dispatcher.
//!
//! [`GatewayHttpService`] handles, per request:
//!
//! 1. Health check interception (`GET /_health`)
//! 2. Request id and cancellation token creation
//! 3. Dispatch through [`Dispatcher`], which reads the body only after the
//!    request is authorized
//! 4. Common response headers (`x-amz-request-id`, `Server`)
//!
//! The cancellation token fires when hyper drops the request future, which
//! happens when the client disconnects mid-request.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bucketgate_auth::{
    AccessKeyExtractor, CredentialExtractor, PolicyEvaluator, StaticCredentialProvider,
    StaticPolicyEvaluator,
};
use http::header::HeaderValue;
use hyper::body::Incoming;
use hyper::service::Service;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::body::GatewayBody;
use crate::dispatch::{Dispatcher, OperationHandler, RequestContext};
use crate::domain::DomainResolver;
use crate::gate::AuthorizationGate;
use crate::table::RouteTable;

const SERVER_NAME: &str = "BucketGate";

/// Configuration for the HTTP service.
#[derive(Clone)]
pub struct GatewayHttpConfig {
    /// Base domains for virtual-hosted addressing, in priority order.
    pub domains: Vec<String>,
    /// Resolves the caller identity.
    pub extractor: Arc<dyn CredentialExtractor>,
    /// Decides whether the caller holds a route's actions.
    pub evaluator: Arc<dyn PolicyEvaluator>,
}

impl fmt::Debug for GatewayHttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayHttpConfig")
            .field("domains", &self.domains)
            .field("extractor", &"...")
            .field("evaluator", &"...")
            .finish()
    }
}

impl Default for GatewayHttpConfig {
    /// No virtual-host domains, anonymous callers only, every action allowed.
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            extractor: Arc::new(AccessKeyExtractor::new(Arc::new(
                StaticCredentialProvider::new(Vec::new()),
            ))),
            evaluator: Arc::new(StaticPolicyEvaluator::allow_all()),
        }
    }
}

/// The gateway's hyper service.
pub struct GatewayHttpService<H: OperationHandler> {
    dispatcher: Arc<Dispatcher<H>>,
}

impl<H: OperationHandler> fmt::Debug for GatewayHttpService<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayHttpService")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl<H: OperationHandler> GatewayHttpService<H> {
    /// Create a service with the standard route table.
    #[must_use]
    pub fn new(handler: H, config: GatewayHttpConfig) -> Self {
        Self::from_shared(Arc::new(handler), config)
    }

    /// Create a service from an `Arc<H>` handler.
    #[must_use]
    pub fn from_shared(handler: Arc<H>, config: GatewayHttpConfig) -> Self {
        let dispatcher = Dispatcher::new(
            DomainResolver::new(&config.domains),
            Arc::new(RouteTable::standard()),
            AuthorizationGate::new(config.extractor, config.evaluator),
            handler,
        );
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

impl<H: OperationHandler> Clone for GatewayHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<H: OperationHandler> Service<http::Request<Incoming>> for GatewayHttpService<H> {
    type Response = http::Response<GatewayBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let dispatcher = Arc::clone(&self.dispatcher);

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let cancel = CancellationToken::new();
            let guard = cancel.clone().drop_guard();

            let response = process_request(req, &dispatcher, &request_id, cancel).await;
            drop(guard.disarm());

            Ok(add_common_headers(response, &request_id))
        })
    }
}

async fn process_request<H: OperationHandler>(
    req: http::Request<Incoming>,
    dispatcher: &Dispatcher<H>,
    request_id: &str,
    cancel: CancellationToken,
) -> http::Response<GatewayBody> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    debug!(%method, %uri, request_id, "processing request");

    if is_health_check(&method, uri.path()) {
        return health_check_response();
    }

    let ctx = RequestContext::new(request_id, cancel);
    dispatcher.handle(req, ctx).await
}

fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == "/_health"
}

fn health_check_response() -> http::Response<GatewayBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(GatewayBody::from_string(r#"{"status":"running"}"#))
        .expect("static health response should be valid")
}

/// Add the headers every gateway response carries.
fn add_common_headers(
    mut response: http::Response<GatewayBody>,
    request_id: &str,
) -> http::Response<GatewayBody> {
    let headers = response.headers_mut();
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-amz-request-id", hv);
    }
    headers.insert(http::header::SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}
