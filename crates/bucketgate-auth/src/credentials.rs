//! Credential provider trait and an in-memory implementation.
//!
//! A [`CredentialProvider`] resolves an access key id to its [`Credential`].
//! The extractor only needs to know that the key exists; the secret is kept
//! for the signature verifier that runs in front of the gateway.

use std::collections::HashMap;
use std::fmt;

use crate::error::AuthError;

/// A known access key and its secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// The public access key id.
    pub access_key_id: String,
    /// The secret used to verify request signatures.
    pub secret_key: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"***")
            .finish()
    }
}

/// Resolves access key ids to credentials.
pub trait CredentialProvider: Send + Sync {
    /// Look up the credential for `access_key_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccessKeyNotFound`] if the key is not recognized.
    fn resolve(&self, access_key_id: &str) -> Result<Credential, AuthError>;
}

/// A credential provider backed by a fixed map.
///
/// # Examples
///
/// ```
/// use bucketgate_auth::credentials::{CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new(vec![("AKID".to_owned(), "secret".to_owned())]);
/// let credential = provider.resolve("AKID").unwrap();
/// assert_eq!(credential.secret_key, "secret");
/// ```
#[derive(Clone, Default)]
pub struct StaticCredentialProvider {
    secrets: HashMap<String, String>,
}

impl fmt::Debug for StaticCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.secrets.keys().collect();
        keys.sort();
        f.debug_struct("StaticCredentialProvider")
            .field("access_keys", &keys)
            .finish()
    }
}

impl StaticCredentialProvider {
    /// Build a provider from `(access_key_id, secret_key)` pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            secrets: credentials.into_iter().collect(),
        }
    }

    /// Number of configured access keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether no access keys are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn resolve(&self, access_key_id: &str) -> Result<Credential, AuthError> {
        self.secrets
            .get(access_key_id)
            .map(|secret| Credential {
                access_key_id: access_key_id.to_owned(),
                secret_key: secret.clone(),
            })
            .ok_or_else(|| AuthError::AccessKeyNotFound(access_key_id.to_owned()))
    }
}
