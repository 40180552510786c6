//! Routes exempt from authentication.

use actix_web::{get, HttpResponse, Responder};
use serde::Serialize;

use warden::http::security::OptionalAuthentication;
use warden::security_override;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

/// Liveness probe; every call is written to the access log.
#[security_override(log_access)]
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(Health { status: "UP" })
}

/// Public landing page.
#[security_override]
#[get("/")]
pub async fn index(caller: OptionalAuthentication) -> impl Responder {
    // bypassed routes never see a caller
    debug_assert!(!caller.is_authenticated());
    HttpResponse::Ok().body("Hello, anonymous!")
}
