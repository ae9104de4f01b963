//! Gateway configuration.
//!
//! Provides [`GatewayConfig`], loaded from environment variables at startup.
//! The route table itself is fixed at build time and is not configurable; the
//! only routing input here is the list of base domains recognized for
//! virtual-hosted addressing.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Gateway configuration.
///
/// # Examples
///
/// ```
/// use bucketgate_core::config::GatewayConfig;
///
/// let config = GatewayConfig::builder()
///     .domains(vec!["s3.example.com".to_owned()])
///     .build();
/// assert_eq!(config.gateway_listen, "0.0.0.0:17410");
/// assert_eq!(config.domains, vec!["s3.example.com"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Bind address (e.g. `"0.0.0.0:17410"`).
    #[builder(default = String::from("0.0.0.0:17410"))]
    pub gateway_listen: String,

    /// Base domains for virtual-hosted addressing, tried in order.
    ///
    /// Each entry may carry a port suffix (`s3.local:9000`).
    #[builder(default)]
    pub domains: Vec<String>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Access key of the single static credential, if any.
    #[builder(default)]
    pub access_key: Option<String>,

    /// Secret key paired with [`access_key`](Self::access_key).
    #[builder(default)]
    pub secret_key: Option<String>,

    /// Path to a JSON file of policy grants.
    #[builder(default)]
    pub policy_file: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:17410` |
    /// | `GATEWAY_DOMAINS` | *(empty)* comma-separated |
    /// | `LOG_LEVEL` | `info` |
    /// | `ACCESS_KEY` / `AWS_ACCESS_KEY_ID` | *(unset)* |
    /// | `SECRET_KEY` / `AWS_SECRET_ACCESS_KEY` | *(unset)* |
    /// | `GATEWAY_POLICY_FILE` | *(unset)* |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("GATEWAY_DOMAINS") {
            config.domains = parse_domains(&v);
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        config.access_key = lookup("ACCESS_KEY").or_else(|| lookup("AWS_ACCESS_KEY_ID"));
        config.secret_key = lookup("SECRET_KEY").or_else(|| lookup("AWS_SECRET_ACCESS_KEY"));
        config.policy_file = lookup("GATEWAY_POLICY_FILE");

        tracing::debug!(domains = ?config.domains, "loaded gateway configuration");
        config
    }
}

/// Split a comma-separated domain list, dropping blanks and a leading dot.
fn parse_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().trim_start_matches('.'))
        .filter(|d| !d.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}
