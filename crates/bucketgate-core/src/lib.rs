//! Core types, errors, and configuration for BucketGate.
//!
//! This crate holds the vocabulary shared by the authorization and HTTP
//! crates: the [`Action`] permission tokens, the logical [`Operation`]s a
//! request can resolve to, the per-request [`BucketAddress`] and
//! [`QueryParams`], the [`GatewayError`] returned to clients, and the [`GatewayConfig`] read at
//! startup.

pub mod config;
pub mod error;
pub mod operation;
pub mod query;
pub mod types;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayErrorCode};
pub use operation::Operation;
pub use query::QueryParams;
pub use types::{Action, AddressingMode, BucketAddress, ParseActionError};
