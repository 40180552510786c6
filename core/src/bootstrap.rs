//! Startup sequence.
//!
//! [`Bootstrap::build`] runs the documented startup steps in order:
//!
//! 1. install logging from `logging.*` (optional)
//! 2. verify the provider catalog has no ambiguous alias
//! 3. register the [`RuntimeConfig`] in the registry
//! 4. install the configured authentication and access managers
//!
//! Any failure aborts startup. Overrides installed on the registry before
//! `build` replace the configured providers.
//!
//! # Example
//! ```
//! use warden_core::http::security::EndpointMetadataTable;
//! use warden_core::settings::RuntimeConfig;
//! use warden_core::Bootstrap;
//!
//! let runtime = Bootstrap::new(RuntimeConfig::empty())
//!     .with_logging(false)
//!     .build()
//!     .unwrap();
//!
//! let security = runtime
//!     .security(EndpointMetadataTable::new().action("GET /items", "read"))
//!     .unwrap();
//! # drop(security);
//! ```

use std::sync::Arc;

use actix_web::http::header::{HeaderName, AUTHORIZATION};
use derive_more::{Display, Error};

use crate::http::security::{AccessManager, AuthenticationManager, EndpointMetadataTable, SecurityTransform};
use crate::logging::{self, LoggingConfig};
use crate::provider::{Capability, ProviderCatalog, ProviderDescriptor, ProviderError, ProviderLoader};
use crate::registry::{ComponentKey, Registry, RegistryError};
use crate::settings::{ConfigError, RuntimeConfig};

/// Configuration key of the credential header name.
pub const CREDENTIAL_HEADER_KEY: &str = "security.header";

/// Startup failure.
#[derive(Debug, Display, Error)]
pub enum BootstrapError {
    #[display("{_0}")]
    Config(#[error(source)] ConfigError),
    #[display("{_0}")]
    Provider(#[error(source)] ProviderError),
    #[display("{_0}")]
    Registry(#[error(source)] RegistryError),
}

impl From<ConfigError> for BootstrapError {
    fn from(error: ConfigError) -> Self {
        BootstrapError::Config(error)
    }
}

impl From<ProviderError> for BootstrapError {
    fn from(error: ProviderError) -> Self {
        BootstrapError::Provider(error)
    }
}

impl From<RegistryError> for BootstrapError {
    fn from(error: RegistryError) -> Self {
        BootstrapError::Registry(error)
    }
}

/// Builder for a [`Runtime`].
pub struct Bootstrap {
    config: RuntimeConfig,
    catalog: ProviderCatalog,
    registry: Arc<Registry>,
    logging: bool,
}

impl Bootstrap {
    /// Starts from `config` and the built-in provider catalog.
    pub fn new(config: RuntimeConfig) -> Self {
        Bootstrap {
            config,
            catalog: ProviderCatalog::builtin(),
            registry: Arc::new(Registry::new()),
            logging: true,
        }
    }

    /// Replaces the provider catalog.
    pub fn catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Adds an application provider to the catalog.
    pub fn with_provider<C: Capability + ?Sized>(mut self, descriptor: ProviderDescriptor<C>) -> Self {
        self.catalog.register(descriptor);
        self
    }

    /// Uses an existing registry, e.g. one with overrides already installed.
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    /// Whether `build` installs the global log subscriber (default: yes).
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    pub fn build(self) -> Result<Runtime, BootstrapError> {
        if self.logging {
            logging::init(&LoggingConfig::from_runtime(&self.config));
        }

        self.catalog.verify()?;
        let credential_header = credential_header(&self.config)?;

        let config = Arc::new(self.config);
        let loader = ProviderLoader::shared(Arc::new(self.catalog), Arc::clone(&config));
        let registry = self.registry;

        let shared = Arc::clone(&config);
        registry.init(&ComponentKey::of::<RuntimeConfig>(), move |_| Ok(shared))?;
        loader.install::<dyn AuthenticationManager>(&registry)?;
        loader.install::<dyn AccessManager>(&registry)?;

        tracing::info!(
            registry = registry.name().unwrap_or("default"),
            components = registry.keys().len(),
            "runtime started"
        );

        Ok(Runtime {
            registry,
            config,
            loader,
            credential_header,
        })
    }
}

fn credential_header(config: &RuntimeConfig) -> Result<HeaderName, ConfigError> {
    match config.get_string(CREDENTIAL_HEADER_KEY) {
        None => Ok(AUTHORIZATION),
        Some(name) => HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::Invalid {
            key: CREDENTIAL_HEADER_KEY.to_string(),
            source: ::config::ConfigError::Message(e.to_string()),
        }),
    }
}

/// A started runtime.
#[derive(Clone, Debug)]
pub struct Runtime {
    registry: Arc<Registry>,
    config: Arc<RuntimeConfig>,
    loader: ProviderLoader,
    credential_header: HeaderName,
}

impl Runtime {
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn loader(&self) -> &ProviderLoader {
        &self.loader
    }

    pub fn credential_header(&self) -> &HeaderName {
        &self.credential_header
    }

    /// Security middleware wired to the installed managers.
    pub fn security(&self, metadata: EndpointMetadataTable) -> Result<SecurityTransform, RegistryError> {
        Ok(SecurityTransform::from_registry(&self.registry, metadata)?
            .credential_header(self.credential_header.clone()))
    }
}
