//! S3 request routing, authorization gating, dispatch, and hyper service.
//!
//! - **Domain resolution** ([`domain`]): host and path to bucket, key and
//!   addressing mode, over an ordered list of base domains.
//! - **Route table** ([`table`]): the immutable, priority-ordered catalog of
//!   route rules and the permissions each requires.
//! - **Matching** ([`matcher`]): method, path shape, query and headers to the
//!   first satisfied rule, or `MethodNotAllowed` / not found.
//! - **Authorization** ([`gate`]): credential extraction and policy
//!   evaluation around the handler call. Fails closed.
//! - **Dispatch** ([`dispatch`]): the per-request pipeline and the
//!   [`OperationHandler`](dispatch::OperationHandler) trait.
//! - **Service** ([`service`]): the hyper `Service` with request ids,
//!   cancellation, and common headers.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> GatewayHttpService (hyper Service)
//!     -> Health check interception
//!     -> Body collection, request id, cancellation token
//!     -> Dispatcher
//!       -> DomainResolver (bucket, key, addressing mode)
//!       -> match_route (RouteTable, fixed priority order)
//!       -> AuthorizationGate (CredentialExtractor, PolicyEvaluator)
//!       -> OperationHandler
//!     -> Common response headers (x-amz-request-id, Server)
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use bucketgate_http::dispatch::NotImplementedHandler;
//! use bucketgate_http::service::{GatewayHttpConfig, GatewayHttpService};
//!
//! let config = GatewayHttpConfig {
//!     domains: vec!["s3.example.com".to_owned()],
//!     ..GatewayHttpConfig::default()
//! };
//! let service = GatewayHttpService::new(NotImplementedHandler, config);
//! // Serve `service` with hyper.
//! ```

// GatewayError is returned by value from every routing and gating step.
#![allow(clippy::result_large_err)]

pub mod body;
pub mod dispatch;
pub mod domain;
pub mod gate;
pub mod matcher;
pub mod response;
pub mod service;
pub mod table;

pub use body::GatewayBody;
pub use dispatch::{Dispatcher, NotImplementedHandler, OperationHandler, RequestContext};
pub use domain::DomainResolver;
pub use gate::AuthorizationGate;
pub use matcher::{MatchOutcome, RouteMatch, match_route};
pub use response::error_to_response;
pub use service::{GatewayHttpConfig, GatewayHttpService};
pub use table::{PathShape, RouteRule, RouteTable};
