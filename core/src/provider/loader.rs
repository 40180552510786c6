//! Configuration-driven provider loading.

use std::sync::Arc;

use crate::provider::{Capability, ProviderCatalog, ProviderDescriptor, ProviderError};
use crate::registry::{ComponentKey, Registry, RegistryError};
use crate::settings::RuntimeConfig;

/// Resolves configured aliases into provider instances.
///
/// Cheap to clone; the catalog and configuration are shared.
#[derive(Clone, Debug)]
pub struct ProviderLoader {
    catalog: Arc<ProviderCatalog>,
    config: Arc<RuntimeConfig>,
}

impl ProviderLoader {
    pub fn new(catalog: ProviderCatalog, config: RuntimeConfig) -> Self {
        Self::shared(Arc::new(catalog), Arc::new(config))
    }

    pub fn shared(catalog: Arc<ProviderCatalog>, config: Arc<RuntimeConfig>) -> Self {
        ProviderLoader { catalog, config }
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Every provider known for `C`.
    pub fn discover<C: Capability + ?Sized>(&self) -> &[ProviderDescriptor<C>] {
        self.catalog.discover::<C>()
    }

    /// Alias configured under `"<C::NAME>.provider"`, or `"default"`.
    pub fn configured_alias<C: Capability + ?Sized>(&self) -> String {
        self.config.provider_alias(C::NAME)
    }

    /// Builds the `C` provider registered under `alias`.
    pub fn configure<C: Capability + ?Sized>(&self, alias: &str) -> Result<Arc<C>, ProviderError> {
        self.catalog.configure::<C>(&self.config, alias)
    }

    /// Builds the `C` provider named by the configuration.
    pub fn load<C: Capability + ?Sized>(&self) -> Result<Arc<C>, ProviderError> {
        let alias = self.configured_alias::<C>();
        self.configure::<C>(&alias)
    }

    /// Registers the configured `C` provider into `registry` and builds it.
    ///
    /// An override installed on the registry beforehand takes precedence over
    /// the configured alias.
    pub fn install<C: Capability + ?Sized>(&self, registry: &Registry) -> Result<Arc<C>, RegistryError> {
        let loader = self.clone();
        registry.init(&ComponentKey::of::<C>(), move |_| {
            loader.load::<C>().map_err(RegistryError::from)
        })
    }
}
