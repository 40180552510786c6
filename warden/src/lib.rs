//! # Warden
//!
//! Component registry, pluggable providers and a secure-by-default request
//! pipeline for Actix Web services.
//!
//! This crate combines:
//! - `warden-core`: registry, provider loading, security middleware
//! - `warden-codegen`: `#[requires_action]` and `#[security_override]`
//!
//! ## Example
//!
//! ```rust,ignore
//! use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
//! use warden::prelude::*;
//!
//! #[requires_action("read")]
//! #[get("/items")]
//! async fn list_items(caller: Authenticated) -> impl Responder {
//!     HttpResponse::Ok().body(format!("items for {}", caller.sso_id()))
//! }
//!
//! #[actix_web::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = Bootstrap::new(RuntimeConfig::from_file("warden.toml")?).build()?;
//!     let security = runtime.security(EndpointMetadataTable::declared()?)?;
//!
//!     HttpServer::new(move || {
//!         App::new().service(web::scope("").wrap(security.clone()).service(list_items))
//!     })
//!     .bind("127.0.0.1:8080")?
//!     .run()
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `macros` | Yes | `#[requires_action]`, `#[security_override]` |

pub use warden_core::*;

#[cfg(feature = "macros")]
pub use warden_codegen::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use warden_core::http::security::{
        AccessManager, Authenticated, Authentication, AuthenticationManager, AuthenticationResult,
        EndpointMetadataTable, OptionalAuthentication, SecurityContext, SecurityTransform,
    };
    pub use warden_core::{Bootstrap, ComponentKey, Registry, RuntimeConfig};

    #[cfg(feature = "macros")]
    pub use warden_codegen::{requires_action, security_override};
}
