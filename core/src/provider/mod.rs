//! Alias-based discovery of pluggable backends.
//!
//! A *capability* is an abstract contract such as
//! [`AuthenticationManager`](crate::http::security::AuthenticationManager).
//! Concrete implementations are published as [`ProviderDescriptor`]s in a
//! [`ProviderCatalog`], each under an alias. At startup the
//! [`ProviderLoader`] reads `"<capability>.provider"` from the configuration
//! (default `"default"`), finds the matching descriptor and runs its factory.
//!
//! The catalog is an explicit table filled in one documented startup step;
//! nothing is discovered by scanning.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use warden_core::provider::{Capability, ProviderCatalog, ProviderDescriptor, ProviderLoader};
//! use warden_core::settings::RuntimeConfig;
//!
//! pub trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! impl Capability for dyn Clock {
//!     const NAME: &'static str = "clock";
//! }
//!
//! struct Frozen;
//!
//! impl Clock for Frozen {
//!     fn now(&self) -> u64 {
//!         42
//!     }
//! }
//!
//! let catalog = ProviderCatalog::new().with_provider(ProviderDescriptor::new(
//!     "default",
//!     "Frozen",
//!     |_| Ok(Arc::new(Frozen) as Arc<dyn Clock>),
//! ));
//!
//! let loader = ProviderLoader::new(catalog, RuntimeConfig::empty());
//! assert_eq!(loader.load::<dyn Clock>().unwrap().now(), 42);
//! ```

mod catalog;
mod error;
mod loader;

use std::fmt;
use std::sync::Arc;

pub use catalog::ProviderCatalog;
pub use error::ProviderError;
pub use loader::ProviderLoader;

use crate::settings::RuntimeConfig;

/// An abstract contract that several providers can satisfy.
///
/// Implemented for the capability's trait object, e.g.
/// `impl Capability for dyn AuthenticationManager`.
pub trait Capability: Send + Sync + 'static {
    /// Capability name, also the configuration prefix (`"<NAME>.provider"`).
    const NAME: &'static str;
}

/// Factory producing a capability instance from the runtime configuration.
pub type ProviderFactory<C> =
    Arc<dyn Fn(&RuntimeConfig) -> Result<Arc<C>, ProviderError> + Send + Sync>;

/// One named implementation of capability `C`.
pub struct ProviderDescriptor<C: ?Sized> {
    alias: String,
    provider_type: &'static str,
    factory: ProviderFactory<C>,
}

impl<C: Capability + ?Sized> ProviderDescriptor<C> {
    /// Creates a descriptor.
    ///
    /// # Arguments
    /// * `alias` - name used in configuration, matched case-sensitively
    /// * `provider_type` - implementation name, for diagnostics
    /// * `factory` - builds the instance from the runtime configuration
    pub fn new<F>(alias: impl Into<String>, provider_type: &'static str, factory: F) -> Self
    where
        F: Fn(&RuntimeConfig) -> Result<Arc<C>, ProviderError> + Send + Sync + 'static,
    {
        ProviderDescriptor {
            alias: alias.into(),
            provider_type,
            factory: Arc::new(factory),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn provider_type(&self) -> &'static str {
        self.provider_type
    }

    /// Runs the factory.
    pub fn instantiate(&self, config: &RuntimeConfig) -> Result<Arc<C>, ProviderError> {
        (self.factory)(config)
    }
}

impl<C: ?Sized> Clone for ProviderDescriptor<C> {
    fn clone(&self) -> Self {
        ProviderDescriptor {
            alias: self.alias.clone(),
            provider_type: self.provider_type,
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<C: ?Sized> fmt::Debug for ProviderDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("alias", &self.alias)
            .field("provider_type", &self.provider_type)
            .finish()
    }
}
