//! Common test utilities and configuration.
//!
//! This module provides shared test infrastructure including:
//! - Fake authentication and access managers
//! - Test handlers declared with the endpoint macros
//! - Test app builder

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::{get, post, web, App, HttpResponse, Responder};
use actix_web::test::init_service;
use futures_util::future::{lazy, ready, BoxFuture, FutureExt};

use warden::http::security::{
    AccessManager, Authenticated, Authentication, AuthenticationManager, AuthenticationResult,
    EndpointMetadataTable, OptionalAuthentication, SecurityContext, SecurityTransform,
};
use warden::{requires_action, security_override};

// =============================================================================
// Test Identities
// =============================================================================

/// alice: `reader` role
pub const ALICE_TOKEN: &str = "t-alice";
/// bob: `reader` and `writer` roles
pub const BOB_TOKEN: &str = "t-bob";
/// batch: application caller without roles
pub const BATCH_TOKEN: &str = "t-batch";

pub fn alice() -> Authentication {
    Authentication::new("alice").role("reader", "true")
}

pub fn bob() -> Authentication {
    Authentication::new("bob").role("reader", "true").role("writer", "true")
}

pub fn batch() -> Authentication {
    Authentication::new("batch").application(true)
}

// =============================================================================
// Fake Managers
// =============================================================================

/// Token table authentication that counts its calls.
pub struct FakeAuthenticationManager {
    identities: HashMap<String, Authentication>,
    anonymous: Option<Authentication>,
    calls: Arc<AtomicUsize>,
}

impl FakeAuthenticationManager {
    /// Knows alice, bob and batch; a missing credential is invalid.
    pub fn new() -> Self {
        FakeAuthenticationManager {
            identities: HashMap::from([
                (ALICE_TOKEN.to_string(), alice()),
                (BOB_TOKEN.to_string(), bob()),
                (BATCH_TOKEN.to_string(), batch()),
            ]),
            anonymous: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Maps a missing credential to the `anonymous` identity.
    pub fn with_default_identity(mut self) -> Self {
        self.anonymous = Some(Authentication::new("anonymous").role("guest", "true"));
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl AuthenticationManager for FakeAuthenticationManager {
    fn authenticate<'a>(&'a self, credential: Option<&'a str>) -> BoxFuture<'a, AuthenticationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let result: AuthenticationResult = match credential {
            None => self.anonymous.clone().into(),
            Some(token) => self
                .identities
                .get(token)
                .map(|identity| identity.reissue(Some(token)))
                .into(),
        };
        ready(result).boxed()
    }
}

/// Grants exactly the listed `(sso_id, action)` pairs.
#[derive(Default)]
pub struct FakeAccessManager {
    grants: HashSet<(String, String)>,
}

impl FakeAccessManager {
    /// Nothing is granted.
    pub fn deny_everything() -> Self {
        Self::default()
    }

    /// alice may read; bob may read and write; anonymous may read.
    pub fn standard() -> Self {
        Self::default()
            .allow("alice", "read")
            .allow("bob", "read")
            .allow("bob", "write")
            .allow("anonymous", "read")
    }

    pub fn allow(mut self, sso_id: &str, action: &str) -> Self {
        self.grants.insert((sso_id.to_string(), action.to_string()));
        self
    }
}

impl AccessManager for FakeAccessManager {
    fn has_access<'a>(&'a self, authentication: &'a Authentication, action: &'a str) -> BoxFuture<'a, bool> {
        let granted = self
            .grants
            .contains(&(authentication.sso_id().to_string(), action.to_string()));
        ready(granted).boxed()
    }
}

/// Panics while its future is polled.
pub struct PanickingAuthenticationManager;

impl AuthenticationManager for PanickingAuthenticationManager {
    fn authenticate<'a>(&'a self, _credential: Option<&'a str>) -> BoxFuture<'a, AuthenticationResult> {
        lazy(|_| -> AuthenticationResult { panic!("identity backend unavailable") }).boxed()
    }
}

/// Panics before returning a future.
pub struct PanickingAccessManager;

impl AccessManager for PanickingAccessManager {
    fn has_access<'a>(&'a self, _authentication: &'a Authentication, _action: &'a str) -> BoxFuture<'a, bool> {
        panic!("policy backend unavailable")
    }
}

// =============================================================================
// Test Handlers
// =============================================================================

#[security_override(log_access)]
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[security_override]
#[get("/whoami")]
pub async fn whoami(caller: OptionalAuthentication) -> impl Responder {
    match caller.into_inner() {
        Some(auth) => HttpResponse::Ok().body(auth.sso_id().to_string()),
        None => HttpResponse::Ok().body("anonymous"),
    }
}

#[security_override]
#[get("/bypass/me")]
pub async fn bypass_me(caller: Authenticated) -> impl Responder {
    HttpResponse::Ok().body(caller.sso_id().to_string())
}

#[requires_action("read")]
#[get("/items")]
pub async fn list_items(caller: Authenticated) -> impl Responder {
    HttpResponse::Ok().body(format!("items for {}", caller.sso_id()))
}

#[requires_action("read")]
#[get("/items/{id}")]
pub async fn get_item(id: web::Path<u32>, caller: Authenticated) -> impl Responder {
    HttpResponse::Ok().body(format!("item {} for {}", id.into_inner(), caller.sso_id()))
}

#[requires_action("write")]
#[post("/items")]
pub async fn create_item(caller: Authenticated) -> impl Responder {
    HttpResponse::Created().body(format!("item added by {}", caller.sso_id()))
}

#[requires_action("write")]
#[post("/orders")]
pub async fn create_order(caller: Authenticated) -> impl Responder {
    HttpResponse::Created().body(format!("created by {}", caller.sso_id()))
}

#[requires_action("read", path = "/api/v1/reports")]
#[get("/reports")]
pub async fn reports(caller: Authenticated) -> impl Responder {
    HttpResponse::Ok().body(format!("reports for {}", caller.sso_id()))
}

/// No declaration: only reachable through an explicit table entry.
#[get("/context")]
pub async fn context() -> impl Responder {
    let sso_id = SecurityContext::sso_id().unwrap_or_default();
    let token = SecurityContext::current()
        .and_then(|auth| auth.forwarding_token().map(str::to_string))
        .unwrap_or_default();
    HttpResponse::Ok().body(format!("{}|{}", sso_id, token))
}

/// No declaration and no table entry.
#[get("/undeclared")]
pub async fn undeclared() -> impl Responder {
    HttpResponse::Ok().body("should never be served")
}

// =============================================================================
// App Builder
// =============================================================================

/// Declared metadata plus the explicit `/context` entry.
pub fn test_metadata() -> EndpointMetadataTable {
    EndpointMetadataTable::declared()
        .unwrap()
        .action("GET /context", "read")
}

pub fn security<A, Z>(authentication: A, access: Z) -> SecurityTransform
where
    A: AuthenticationManager + 'static,
    Z: AccessManager + 'static,
{
    SecurityTransform::new(Arc::new(authentication), Arc::new(access), test_metadata())
}

/// Creates the test app with `security` wrapped around every route.
pub async fn create_test_app(
    security: SecurityTransform,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse,
    Error = actix_web::Error,
> {
    init_service(
        App::new().service(
            web::scope("")
                .wrap(security)
                .service(health)
                .service(whoami)
                .service(bypass_me)
                .service(list_items)
                .service(create_item)
                .service(get_item)
                .service(create_order)
                .service(context)
                .service(undeclared)
                .service(web::scope("/api/v1").service(reports)),
        ),
    )
    .await
}

/// App with the fake managers and the standard grants.
pub async fn create_standard_app() -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse,
    Error = actix_web::Error,
> {
    create_test_app(security(FakeAuthenticationManager::new(), FakeAccessManager::standard())).await
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", token.to_string())
}
