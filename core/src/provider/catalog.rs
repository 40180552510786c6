//! Static provider catalog.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::provider::{Capability, ProviderDescriptor, ProviderError};
use crate::settings::RuntimeConfig;

struct CapabilitySlot {
    name: &'static str,
    aliases: Vec<String>,
    // Vec<ProviderDescriptor<C>> for the slot's capability
    descriptors: Box<dyn Any + Send + Sync>,
}

/// Every known provider, grouped by capability.
///
/// Registration order is kept; duplicate aliases are accepted here and
/// reported as [`ProviderError::AmbiguousProvider`] by [`verify`] and
/// [`configure`], the way two packages shipping the same alias would be.
///
/// [`verify`]: ProviderCatalog::verify
/// [`configure`]: ProviderCatalog::configure
#[derive(Default)]
pub struct ProviderCatalog {
    slots: HashMap<TypeId, CapabilitySlot>,
}

impl ProviderCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-filled with the providers shipped with this crate.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        crate::http::security::manager::register_builtin(&mut catalog);
        catalog
    }

    /// Adds a descriptor (builder style).
    pub fn with_provider<C: Capability + ?Sized>(mut self, descriptor: ProviderDescriptor<C>) -> Self {
        self.register(descriptor);
        self
    }

    /// Adds a descriptor.
    pub fn register<C: Capability + ?Sized>(&mut self, descriptor: ProviderDescriptor<C>) -> &mut Self {
        let slot = self
            .slots
            .entry(TypeId::of::<C>())
            .or_insert_with(|| CapabilitySlot {
                name: C::NAME,
                aliases: Vec::new(),
                descriptors: Box::new(Vec::<ProviderDescriptor<C>>::new()),
            });

        slot.aliases.push(descriptor.alias().to_string());
        if let Some(descriptors) = slot.descriptors.downcast_mut::<Vec<ProviderDescriptor<C>>>() {
            descriptors.push(descriptor);
        }
        self
    }

    /// Every provider registered for capability `C`, in registration order.
    pub fn discover<C: Capability + ?Sized>(&self) -> &[ProviderDescriptor<C>] {
        self.slots
            .get(&TypeId::of::<C>())
            .and_then(|slot| slot.descriptors.downcast_ref::<Vec<ProviderDescriptor<C>>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The single descriptor of `C` registered under `alias`.
    ///
    /// # Errors
    /// - [`ProviderError::UnknownProvider`] if none matches
    /// - [`ProviderError::AmbiguousProvider`] if several match
    pub fn find<C: Capability + ?Sized>(&self, alias: &str) -> Result<&ProviderDescriptor<C>, ProviderError> {
        let mut matches = self.discover::<C>().iter().filter(|d| d.alias() == alias);

        let first = matches.next().ok_or_else(|| ProviderError::UnknownProvider {
            capability: C::NAME,
            alias: alias.to_string(),
        })?;

        let extra = matches.count();
        if extra > 0 {
            return Err(ProviderError::AmbiguousProvider {
                capability: C::NAME,
                alias: alias.to_string(),
                count: extra + 1,
            });
        }

        Ok(first)
    }

    /// Builds the `C` provider registered under `alias`.
    pub fn configure<C: Capability + ?Sized>(
        &self,
        config: &RuntimeConfig,
        alias: &str,
    ) -> Result<Arc<C>, ProviderError> {
        let descriptor = self.find::<C>(alias)?;
        tracing::info!(
            capability = C::NAME,
            alias,
            provider = descriptor.provider_type(),
            "configuring provider"
        );
        descriptor.instantiate(config)
    }

    /// Fails on the first alias shared by two providers of one capability.
    pub fn verify(&self) -> Result<(), ProviderError> {
        for slot in self.slots.values() {
            let mut seen: HashMap<&str, usize> = HashMap::new();
            for alias in &slot.aliases {
                *seen.entry(alias.as_str()).or_default() += 1;
            }
            if let Some((alias, count)) = seen.into_iter().find(|(_, count)| *count > 1) {
                return Err(ProviderError::AmbiguousProvider {
                    capability: slot.name,
                    alias: alias.to_string(),
                    count,
                });
            }
        }
        Ok(())
    }

    /// Names of the capabilities that have at least one provider.
    pub fn capabilities(&self) -> Vec<&'static str> {
        self.slots.values().map(|slot| slot.name).collect()
    }
}

impl std::fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for slot in self.slots.values() {
            map.entry(&slot.name, &slot.aliases);
        }
        map.finish()
    }
}
