//! Built-in authentication managers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{ready, BoxFuture, FutureExt};
use serde::Deserialize;

use crate::http::security::authentication::{Authentication, AuthenticationResult};
use crate::http::security::config::AuthenticationManager;
use crate::settings::{ConfigError, RuntimeConfig};

/// Scheme prefix stripped from credentials before lookup.
const BEARER_PREFIX: &str = "Bearer ";

/// One entry of `authentication.identities`.
#[derive(Clone, Debug, Deserialize)]
pub struct IdentityConfig {
    pub token: String,
    pub sso_id: String,
    #[serde(default)]
    pub application: bool,
    #[serde(default)]
    pub roles: BTreeMap<String, String>,
}

/// Token-to-identity table held in memory.
///
/// A credential is looked up as-is, after removing an optional `Bearer `
/// prefix. A missing or unknown credential is invalid.
///
/// # Example
/// ```
/// use warden_core::http::security::{Authentication, InMemoryAuthenticationManager};
///
/// let manager = InMemoryAuthenticationManager::new()
///     .with_identity("t-alice", Authentication::new("alice").role("reader", "true"))
///     .with_identity("t-batch", Authentication::new("batch").application(true));
///
/// assert_eq!(manager.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryAuthenticationManager {
    identities: HashMap<String, Authentication>,
}

impl InMemoryAuthenticationManager {
    /// Creates a manager with no identities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads identities from `authentication.identities`.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        let entries: Vec<IdentityConfig> = config.get_or("authentication.identities", Vec::new())?;

        Ok(entries.into_iter().fold(Self::new(), |manager, entry| {
            let identity = Authentication::new(entry.sso_id)
                .application(entry.application)
                .roles(entry.roles);
            manager.with_identity(entry.token, identity)
        }))
    }

    /// Adds an identity for a token; the first registration of a token wins.
    pub fn with_identity(mut self, token: impl Into<String>, identity: Authentication) -> Self {
        use std::collections::hash_map::Entry;
        match self.identities.entry(token.into()) {
            Entry::Occupied(e) => {
                tracing::warn!(
                    sso_id = e.get().sso_id(),
                    "token already mapped to an identity, skipping"
                );
            }
            Entry::Vacant(e) => {
                e.insert(identity);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    fn resolve(&self, credential: Option<&str>) -> AuthenticationResult {
        let Some(raw) = credential else {
            return AuthenticationResult::Invalid;
        };
        let token = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).trim();

        self.identities
            .get(token)
            .map(|template| template.reissue(Some(raw)))
            .into()
    }
}

impl AuthenticationManager for InMemoryAuthenticationManager {
    fn authenticate<'a>(&'a self, credential: Option<&'a str>) -> BoxFuture<'a, AuthenticationResult> {
        ready(self.resolve(credential)).boxed()
    }
}

/// Bounds a delegate manager's authentication time.
///
/// A call that does not finish within the timeout is answered with
/// [`AuthenticationResult::Invalid`]. Requires a Tokio runtime with the time
/// driver, which actix-web provides.
pub struct TimeoutAuthenticationManager {
    delegate: Arc<dyn AuthenticationManager>,
    timeout: Duration,
}

impl TimeoutAuthenticationManager {
    pub fn new(delegate: Arc<dyn AuthenticationManager>, timeout: Duration) -> Self {
        TimeoutAuthenticationManager { delegate, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl AuthenticationManager for TimeoutAuthenticationManager {
    fn authenticate<'a>(&'a self, credential: Option<&'a str>) -> BoxFuture<'a, AuthenticationResult> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.delegate.authenticate(credential)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = self.timeout.as_millis() as u64,
                        "authentication timed out"
                    );
                    AuthenticationResult::Invalid
                }
            }
        })
    }
}
