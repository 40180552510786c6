//! Warden Demo Application
//!
//! Configuration-driven authentication and action-based authorization.


use actix_web::{web, App, HttpServer};

use warden::http::security::EndpointMetadataTable;
use warden::{Bootstrap, RuntimeConfig};

/// Configuration file read from the working directory, if present.
const CONFIG_FILE: &str = "warden.toml";

/// Prefix of environment overrides, e.g. `WARDEN_ACCESS__PROVIDER=deny-all`.
const ENV_PREFIX: &str = "WARDEN";

fn print_startup_info() {
    println!("=== Warden Demo ===");
    println!();
    println!("Server: http://127.0.0.1:8080");
    println!();
    println!("Identities (from {}):", CONFIG_FILE);
    println!("  t-alice - roles: [reader]");
    println!("  t-bob   - roles: [reader, writer]");
    println!("  t-root  - roles: [admin, reader, writer]");
    println!();
    println!("Routes:");
    println!("  GET  /                - #[security_override]");
    println!("  GET  /health          - #[security_override(log_access)]");
    println!("  GET  /items           - #[requires_action(\"read\")]");
    println!("  GET  /items/{{id}}      - #[requires_action(\"read\")]");
    println!("  POST /orders          - #[requires_action(\"write\")]");
    println!("  GET  /admin/dashboard - #[requires_action(\"admin\")]");
    println!("  GET  /admin/debug     - undeclared, always 403");
    println!();
    println!("Examples:");
    println!("  curl http://127.0.0.1:8080/health");
    println!("  curl -H 'Authorization: Bearer t-alice' http://127.0.0.1:8080/items");
    println!("  curl -H 'Authorization: Bearer t-alice' -X POST http://127.0.0.1:8080/orders  # 403");
    println!("  curl http://127.0.0.1:8080/items                                              # 401");
    println!();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = RuntimeConfig::builder()
        .add_optional_file(CONFIG_FILE)
        .add_env(ENV_PREFIX)
        .build()
        .map_err(std::io::Error::other)?;

    let runtime = Bootstrap::new(config).build().map_err(std::io::Error::other)?;
    let metadata = EndpointMetadataTable::declared().map_err(std::io::Error::other)?;
    let security = runtime.security(metadata).map_err(std::io::Error::other)?;

    print_startup_info();

    HttpServer::new(move || {
        App::new().service(
            web::scope("")
                .wrap(security.clone())
                // Public routes
                .service(handlers::public::index)
                .service(handlers::public::health)
                // Item routes
                .service(handlers::items::list_items)
                .service(handlers::items::get_item)
                .service(handlers::items::create_order)
                // Admin routes
                .service(handlers::admin::dashboard)
                .service(handlers::admin::debug),
        )
    })
    .bind("127.0.0.1:8080")?
    .run()
    .await
}
