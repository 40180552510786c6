//! Providers shipped with the crate.
//!
//! | capability | alias | provider |
//! |------------|-------|----------|
//! | `authentication` | `default` | [`InMemoryAuthenticationManager`], wrapped in a [`TimeoutAuthenticationManager`] when `authentication.timeout_ms` is set |
//! | `access` | `default` | [`RoleAccessManager`] |
//! | `access` | `deny-all` | [`DenyAllAccessManager`] |

use std::sync::Arc;
use std::time::Duration;

use crate::http::security::authenticator::{InMemoryAuthenticationManager, TimeoutAuthenticationManager};
use crate::http::security::authorizer::{DenyAllAccessManager, RoleAccessManager};
use crate::http::security::config::{AccessManager, AuthenticationManager};
use crate::provider::{Capability, ProviderCatalog, ProviderDescriptor, ProviderError};
use crate::settings::{RuntimeConfig, DEFAULT_PROVIDER_ALIAS};

/// Alias of [`DenyAllAccessManager`].
pub const DENY_ALL_ALIAS: &str = "deny-all";

/// Adds the built-in providers to `catalog`.
pub fn register_builtin(catalog: &mut ProviderCatalog) {
    catalog
        .register(ProviderDescriptor::<dyn AuthenticationManager>::new(
            DEFAULT_PROVIDER_ALIAS,
            "InMemoryAuthenticationManager",
            in_memory_authentication,
        ))
        .register(ProviderDescriptor::<dyn AccessManager>::new(
            DEFAULT_PROVIDER_ALIAS,
            "RoleAccessManager",
            |config| Ok(Arc::new(RoleAccessManager::from_config(config)?) as Arc<dyn AccessManager>),
        ))
        .register(ProviderDescriptor::<dyn AccessManager>::new(
            DENY_ALL_ALIAS,
            "DenyAllAccessManager",
            |_| Ok(Arc::new(DenyAllAccessManager) as Arc<dyn AccessManager>),
        ));
}

fn in_memory_authentication(config: &RuntimeConfig) -> Result<Arc<dyn AuthenticationManager>, ProviderError> {
    let manager: Arc<dyn AuthenticationManager> = Arc::new(InMemoryAuthenticationManager::from_config(config)?);

    match config.get::<u64>("authentication.timeout_ms")? {
        Some(0) => Err(ProviderError::InvalidConfig {
            capability: <dyn AuthenticationManager as Capability>::NAME,
            alias: DEFAULT_PROVIDER_ALIAS.to_string(),
            reason: "authentication.timeout_ms must be positive".to_string(),
        }),
        Some(ms) => Ok(Arc::new(TimeoutAuthenticationManager::new(
            manager,
            Duration::from_millis(ms),
        ))),
        None => Ok(manager),
    }
}
