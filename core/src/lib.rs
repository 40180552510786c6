//! # Warden Core
//!
//! Component registry, provider loading and the per-request security pipeline
//! of a pluggable actix-web service runtime.
//!
//! ## Modules
//!
//! - [`registry`] - Type-keyed component registry with lazy singleton construction
//! - [`provider`] - Alias-based discovery of pluggable backends
//! - [`http::security`] - Authentication, authorization and the security middleware
//! - [`http::error`] - HTTP-facing error types
//! - [`settings`] - Runtime configuration
//! - [`logging`] - Process-wide logging setup
//! - [`bootstrap`] - Startup sequence tying the above together

pub mod bootstrap;
pub mod http;
pub mod logging;
pub mod provider;
pub mod registry;
pub mod settings;

pub use bootstrap::{Bootstrap, BootstrapError, Runtime};
pub use provider::{Capability, ProviderCatalog, ProviderDescriptor, ProviderError, ProviderLoader};
pub use registry::{ComponentKey, ComponentState, Registry, RegistryError, RegistryPolicy};
pub use settings::{ConfigError, RuntimeConfig};

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
