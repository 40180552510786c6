//! Pluggable manager contracts.
//!
//! Both traits return boxed futures so network-backed implementations can
//! await without blocking a worker; in-memory implementations simply return
//! a ready future.

use futures_util::future::BoxFuture;

use crate::http::security::authentication::{Authentication, AuthenticationResult};
use crate::provider::Capability;

/// Turns a raw credential header value into an identity.
///
/// # Contract
/// - A missing credential (`None`) is answered, not rejected with a panic.
///   Production implementations answer [`AuthenticationResult::Invalid`];
///   only test fakes should map it to a default identity.
/// - Pure in the credential: the same input yields an equal
///   [`Authentication`] (correlation ids aside).
/// - Timeouts are the implementation's job and end as `Invalid`.
pub trait AuthenticationManager: Send + Sync {
    fn authenticate<'a>(&'a self, credential: Option<&'a str>) -> BoxFuture<'a, AuthenticationResult>;
}

/// Decides whether an identity may perform a named action.
///
/// # Contract
/// Side-effect free and total: a rule that cannot be evaluated yields `false`.
pub trait AccessManager: Send + Sync {
    fn has_access<'a>(&'a self, authentication: &'a Authentication, action: &'a str) -> BoxFuture<'a, bool>;
}

impl Capability for dyn AuthenticationManager {
    const NAME: &'static str = "authentication";
}

impl Capability for dyn AccessManager {
    const NAME: &'static str = "access";
}
