//! Caller identity resolved from a credential.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

type TokenDeriver = Arc<dyn Fn(&Authentication) -> String + Send + Sync>;

/// Identity of an authenticated caller.
///
/// Built once by an [`AuthenticationManager`](super::AuthenticationManager)
/// and read-only afterwards. Two values are equal when their `sso_id`,
/// application flag and roles are equal; the correlation id and the credential
/// are per-request details.
///
/// # Example
/// ```
/// use warden_core::http::security::Authentication;
///
/// let auth = Authentication::new("alice")
///     .role("reader", "true")
///     .role("region", "eu")
///     .credential("Bearer abc");
///
/// assert!(auth.has_role("reader"));
/// assert_eq!(auth.role_value("region"), Some("eu"));
/// assert_eq!(auth.forwarding_token(), Some("Bearer abc"));
/// ```
#[derive(Clone)]
pub struct Authentication {
    sso_id: String,
    is_application: bool,
    roles: BTreeMap<String, String>,
    correlation_id: String,
    credential: Option<String>,
    token_deriver: Option<TokenDeriver>,
    forwarding_token: OnceLock<Option<String>>,
}

impl Authentication {
    /// Creates a human caller identity with no roles.
    pub fn new(sso_id: impl Into<String>) -> Self {
        Authentication {
            sso_id: sso_id.into(),
            is_application: false,
            roles: BTreeMap::new(),
            correlation_id: new_correlation_id(),
            credential: None,
            token_deriver: None,
            forwarding_token: OnceLock::new(),
        }
    }

    /// Marks the identity as an application-to-application caller.
    pub fn application(mut self, is_application: bool) -> Self {
        self.is_application = is_application;
        self
    }

    /// Adds a role or attribute.
    pub fn role(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.roles.insert(name.into(), value.into());
        self
    }

    /// Adds several roles or attributes.
    pub fn roles<K, V>(mut self, roles: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.roles
            .extend(roles.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Records the credential the identity was resolved from.
    ///
    /// Unless a deriver is set, it doubles as the forwarding token.
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Computes the forwarding token lazily with `deriver` instead of reusing
    /// the credential.
    pub fn forwarding_token_with<F>(mut self, deriver: F) -> Self
    where
        F: Fn(&Authentication) -> String + Send + Sync + 'static,
    {
        self.token_deriver = Some(Arc::new(deriver));
        self
    }

    pub fn sso_id(&self) -> &str {
        &self.sso_id
    }

    pub fn is_application(&self) -> bool {
        self.is_application
    }

    pub fn roles_map(&self) -> &BTreeMap<String, String> {
        &self.roles
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// Checks if the identity holds ANY of the given roles.
    pub fn has_any_role(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has_role(name))
    }

    pub fn role_value(&self, name: &str) -> Option<&str> {
        self.roles.get(name).map(String::as_str)
    }

    /// Id generated for this authentication, for correlating log lines.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Credential usable for downstream calls, computed on first access.
    pub fn forwarding_token(&self) -> Option<&str> {
        self.forwarding_token
            .get_or_init(|| match &self.token_deriver {
                Some(deriver) => Some(deriver(self)),
                None => self.credential.clone(),
            })
            .as_deref()
    }

    /// Copy of this identity for a new request: fresh correlation id, the
    /// given credential, nothing computed yet.
    pub fn reissue(&self, credential: Option<&str>) -> Self {
        Authentication {
            sso_id: self.sso_id.clone(),
            is_application: self.is_application,
            roles: self.roles.clone(),
            correlation_id: new_correlation_id(),
            credential: credential.map(str::to_string),
            token_deriver: self.token_deriver.clone(),
            forwarding_token: OnceLock::new(),
        }
    }
}

impl PartialEq for Authentication {
    fn eq(&self, other: &Self) -> bool {
        self.sso_id == other.sso_id
            && self.is_application == other.is_application
            && self.roles == other.roles
    }
}

impl Eq for Authentication {}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("sso_id", &self.sso_id)
            .field("is_application", &self.is_application)
            .field("roles", &self.roles)
            .field("correlation_id", &self.correlation_id)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Authentication {{ sso_id: {}, application: {}, roles: {:?} }}",
            self.sso_id,
            self.is_application,
            self.roles.keys().collect::<Vec<_>>()
        )
    }
}

fn new_correlation_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Outcome of [`AuthenticationManager::authenticate`](super::AuthenticationManager::authenticate).
///
/// A result is valid exactly when it carries an identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthenticationResult {
    Valid(Authentication),
    Invalid,
}

impl AuthenticationResult {
    pub fn valid(authentication: Authentication) -> Self {
        AuthenticationResult::Valid(authentication)
    }

    pub fn invalid() -> Self {
        AuthenticationResult::Invalid
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, AuthenticationResult::Valid(_))
    }

    pub fn authentication(&self) -> Option<&Authentication> {
        match self {
            AuthenticationResult::Valid(authentication) => Some(authentication),
            AuthenticationResult::Invalid => None,
        }
    }

    pub fn into_authentication(self) -> Option<Authentication> {
        match self {
            AuthenticationResult::Valid(authentication) => Some(authentication),
            AuthenticationResult::Invalid => None,
        }
    }
}

impl From<Option<Authentication>> for AuthenticationResult {
    fn from(authentication: Option<Authentication>) -> Self {
        authentication.map_or(AuthenticationResult::Invalid, AuthenticationResult::Valid)
    }
}
