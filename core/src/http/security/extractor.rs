//! Extractors for the authenticated caller.

use std::future::{ready, Ready};
use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};

use crate::http::error::AuthError;
use crate::http::security::Authentication;

/// Extractor for the caller the middleware authenticated.
///
/// # Usage
/// ```ignore
/// use warden_core::http::security::Authenticated;
///
/// async fn handler(caller: Authenticated) -> impl Responder {
///     format!("Hello, {}!", caller.sso_id())
/// }
/// ```
///
/// # Errors
/// Returns `401 Unauthorized` when no caller is attached, e.g. on a bypassed
/// endpoint.
#[derive(Debug, Clone)]
pub struct Authenticated(Authentication);

impl Authenticated {
    pub fn new(authentication: Authentication) -> Self {
        Authenticated(authentication)
    }

    pub fn into_inner(self) -> Authentication {
        self.0
    }
}

impl Deref for Authenticated {
    type Target = Authentication;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Authenticated {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Authentication>().cloned() {
            Some(authentication) => ready(Ok(Authenticated(authentication))),
            None => ready(Err(AuthError::Unauthorized)),
        }
    }
}

/// Optional extractor for the caller; `None` on bypassed endpoints.
#[derive(Debug, Clone)]
pub struct OptionalAuthentication(Option<Authentication>);

impl OptionalAuthentication {
    pub fn into_inner(self) -> Option<Authentication> {
        self.0
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl Deref for OptionalAuthentication {
    type Target = Option<Authentication>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for OptionalAuthentication {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalAuthentication(
            req.extensions().get::<Authentication>().cloned(),
        )))
    }
}

/// Extension trait for reading the caller off a request.
pub trait SecurityExt {
    fn authentication(&self) -> Option<Authentication>;

    fn is_authenticated(&self) -> bool;

    fn has_role(&self, role: &str) -> bool;
}

impl SecurityExt for HttpRequest {
    fn authentication(&self) -> Option<Authentication> {
        self.extensions().get::<Authentication>().cloned()
    }

    fn is_authenticated(&self) -> bool {
        self.extensions().get::<Authentication>().is_some()
    }

    fn has_role(&self, role: &str) -> bool {
        self.extensions()
            .get::<Authentication>()
            .is_some_and(|a| a.has_role(role))
    }
}
