//! Task-local access to the current caller.
//!
//! The security middleware runs every granted handler inside
//! [`SecurityContext::run_with`], so code called from the handler (service
//! layer, outbound clients) can read the caller without threading it through
//! every signature.
//!
//! ```ignore
//! use warden_core::http::security::SecurityContext;
//!
//! fn outbound_token() -> Option<String> {
//!     SecurityContext::current().and_then(|auth| auth.forwarding_token().map(str::to_string))
//! }
//! ```
//!
//! Each task has its own context; a task spawned from a handler starts
//! without one.

use crate::http::security::Authentication;

tokio::task_local! {
    static SECURITY_CONTEXT: Option<Authentication>;
}

/// Holder for the current caller.
pub struct SecurityContext;

impl SecurityContext {
    /// The caller of the request being handled on this task.
    pub fn current() -> Option<Authentication> {
        SECURITY_CONTEXT
            .try_with(|auth| auth.clone())
            .ok()
            .flatten()
    }

    pub fn sso_id() -> Option<String> {
        Self::current().map(|auth| auth.sso_id().to_string())
    }

    pub fn is_authenticated() -> bool {
        SECURITY_CONTEXT
            .try_with(|auth| auth.is_some())
            .unwrap_or(false)
    }

    pub fn has_role(role: &str) -> bool {
        SECURITY_CONTEXT
            .try_with(|auth| auth.as_ref().is_some_and(|a| a.has_role(role)))
            .unwrap_or(false)
    }

    /// Runs `f` with `authentication` as the current caller.
    pub async fn run_with<F, R>(authentication: Option<Authentication>, f: F) -> R
    where
        F: std::future::Future<Output = R>,
    {
        SECURITY_CONTEXT.scope(authentication, f).await
    }
}
