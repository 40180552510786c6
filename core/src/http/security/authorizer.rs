//! Built-in access managers.

use std::collections::{BTreeSet, HashMap};

use futures_util::future::{ready, BoxFuture, FutureExt};

use crate::http::security::authentication::Authentication;
use crate::http::security::config::AccessManager;
use crate::settings::{ConfigError, RuntimeConfig};

/// Action-to-roles table.
///
/// Access is granted when the identity holds ANY role listed for the action.
/// Actions with no entry are denied.
///
/// # Example
/// ```
/// use warden_core::http::security::RoleAccessManager;
///
/// let manager = RoleAccessManager::new()
///     .grant("read", ["reader", "admin"])
///     .grant("write", ["admin"]);
///
/// assert!(manager.allows_role("read", "reader"));
/// assert!(!manager.allows_role("write", "reader"));
/// assert!(!manager.allows_role("delete", "admin"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RoleAccessManager {
    actions: HashMap<String, BTreeSet<String>>,
}

impl RoleAccessManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `access.actions`, a table of action name to role names.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        let actions: HashMap<String, Vec<String>> = config.get_or("access.actions", HashMap::new())?;

        Ok(actions
            .into_iter()
            .fold(Self::new(), |manager, (action, roles)| manager.grant(action, roles)))
    }

    /// Allows `roles` to perform `action`, adding to any roles already granted.
    pub fn grant<I, R>(mut self, action: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.actions
            .entry(action.into())
            .or_default()
            .extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn allows_role(&self, action: &str, role: &str) -> bool {
        self.actions
            .get(action)
            .is_some_and(|roles| roles.contains(role))
    }

    /// Names of the actions with at least one rule.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    fn decide(&self, authentication: &Authentication, action: &str) -> bool {
        match self.actions.get(action) {
            Some(roles) => roles.iter().any(|role| authentication.has_role(role)),
            None => {
                tracing::debug!(action, "no rule for action");
                false
            }
        }
    }
}

impl AccessManager for RoleAccessManager {
    fn has_access<'a>(&'a self, authentication: &'a Authentication, action: &'a str) -> BoxFuture<'a, bool> {
        ready(self.decide(authentication, action)).boxed()
    }
}

/// Denies every action.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenyAllAccessManager;

impl AccessManager for DenyAllAccessManager {
    fn has_access<'a>(&'a self, _authentication: &'a Authentication, _action: &'a str) -> BoxFuture<'a, bool> {
        ready(false).boxed()
    }
}
