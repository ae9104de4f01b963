//! Bucket resolution from the `Host` header and the URI path.
//!
//! Configured base domains are tried in order. A host of the form
//! `{bucket}.{domain}` or `{bucket}.{domain}:{port}` (digits only) selects
//! virtual-hosted addressing with the prefix as the bucket name; the match is
//! on the suffix, so bucket names containing dots still resolve. When no
//! domain matches, the request is path-style: `/{bucket}/{key...}`.

use bucketgate_core::{AddressingMode, BucketAddress};
use percent_encoding::percent_decode_str;

/// Resolves the bucket and key a request addresses.
#[derive(Debug, Clone, Default)]
pub struct DomainResolver {
    /// Lowercased base domains, in priority order.
    domains: Vec<String>,
}

impl DomainResolver {
    /// Create a resolver for the given base domains.
    #[must_use]
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|d| d.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// The configured base domains.
    #[must_use]
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Resolve a raw host (may be `None` when the request carries none) and path.
    #[must_use]
    pub fn resolve(&self, host: Option<&str>, path: &str) -> BucketAddress {
        if let Some(bucket) = host.and_then(|h| self.virtual_host_bucket(h)) {
            let raw_key = path.strip_prefix('/').unwrap_or(path);
            return BucketAddress {
                bucket: Some(bucket),
                key: non_empty(raw_key).map(decode_uri_component),
                mode: AddressingMode::VirtualHosted,
            };
        }

        let (bucket, key) = parse_path(path);
        BucketAddress {
            bucket,
            key,
            mode: AddressingMode::PathStyle,
        }
    }

    /// The bucket prefix of `host` under the first matching domain.
    fn virtual_host_bucket(&self, host: &str) -> Option<String> {
        let host = host.to_ascii_lowercase();
        self.domains.iter().find_map(|domain| {
            strip_domain(&host, domain).or_else(|| {
                let (name, port) = host.rsplit_once(':')?;
                if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                strip_domain(name, domain)
            })
        })
    }
}

/// `Some(prefix)` if `host` is `{prefix}.{domain}` with a non-empty prefix.
fn strip_domain(host: &str, domain: &str) -> Option<String> {
    let prefix = host.strip_suffix(domain)?.strip_suffix('.')?;
    non_empty(prefix).map(str::to_owned)
}

/// Split `/{bucket}/{key...}` into its parts.
fn parse_path(path: &str) -> (Option<String>, Option<String>) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    match trimmed.split_once('/') {
        Some((bucket, key)) => (
            non_empty(bucket).map(decode_uri_component),
            non_empty(key).map(decode_uri_component),
        ),
        None => (non_empty(trimmed).map(decode_uri_component), None),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}
