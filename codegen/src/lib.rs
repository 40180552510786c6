//! Procedural macros declaring endpoint access metadata.
//!
//! | macro | effect |
//! |-------|--------|
//! | `#[requires_action("read")]` | callers must be allowed the `read` action |
//! | `#[security_override]` | no authentication or authorization |
//! | `#[security_override(log_access)]` | same, and every access is logged |
//!
//! Endpoints without either attribute (and without an explicit entry in the
//! metadata table) are forbidden.
//!
//! # Usage
//!
//! The attribute goes above the actix-web route attribute. Its method and
//! path form the handler id (`GET /items`); `#[route]` declares one handler
//! id per `method = ".."` argument:
//!
//! ```ignore
//! use actix_web::{get, HttpResponse, Responder};
//! use warden::http::security::Authenticated;
//! use warden::{requires_action, security_override};
//!
//! #[requires_action("read")]
//! #[get("/items")]
//! async fn list_items(caller: Authenticated) -> impl Responder {
//!     HttpResponse::Ok().body(format!("items for {}", caller.sso_id()))
//! }
//!
//! #[security_override(log_access)]
//! #[get("/health")]
//! async fn health() -> impl Responder {
//!     HttpResponse::Ok().finish()
//! }
//! ```
//!
//! When the handler is mounted under a scope, the route attribute only holds
//! the suffix; pass the full pattern with `path = "/api/items"`. The method
//! still comes from the route attribute.

use proc_macro::TokenStream;

mod declare;
mod helpers;

/// Requires an action on the endpoint.
///
/// # Usage
/// ```ignore
/// #[requires_action("write")]
/// #[post("/items")]
/// async fn create_item(caller: Authenticated) -> impl Responder {
///     HttpResponse::Created().finish()
/// }
///
/// #[requires_action("read", path = "/api/items/{id}")]
/// #[get("/items/{id}")]
/// async fn get_item(caller: Authenticated) -> impl Responder {
///     HttpResponse::Ok().finish()
/// }
/// ```
#[proc_macro_attribute]
pub fn requires_action(attrs: TokenStream, input: TokenStream) -> TokenStream {
    declare::requires_action_impl(attrs, input)
}

/// Exempts the endpoint from authentication and authorization.
///
/// With `log_access`, each request is logged at info level on the
/// `warden::access` target.
#[proc_macro_attribute]
pub fn security_override(attrs: TokenStream, input: TokenStream) -> TokenStream {
    declare::security_override_impl(attrs, input)
}
