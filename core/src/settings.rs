//! Runtime configuration.
//!
//! A thin layer over the `config` crate: sources (files, environment,
//! programmatic overrides) are merged once at startup and then read through
//! typed accessors.
//!
//! # Keys
//!
//! | key | meaning |
//! |-----|---------|
//! | `<capability>.provider` | provider alias for a capability, default `"default"` |
//! | `authentication.identities` | identities of the in-memory authentication provider |
//! | `authentication.timeout_ms` | upper bound for one authentication call |
//! | `access.actions` | action name to allowed role names |
//! | `security.header` | credential header name, default `Authorization` |
//! | `logging.level` | default log filter, default `info` |
//!
//! # Example
//! ```
//! use warden_core::settings::RuntimeConfig;
//!
//! let config = RuntimeConfig::builder()
//!     .set("authentication.provider", "static")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.provider_alias("authentication"), "static");
//! assert_eq!(config.provider_alias("access"), "default");
//! ```

use std::path::Path;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat, Value};
use derive_more::{Display, Error};
use serde::de::DeserializeOwned;

/// Alias used when `<capability>.provider` is not configured.
pub const DEFAULT_PROVIDER_ALIAS: &str = "default";

/// Suffix of the configuration key naming a capability's provider.
pub const PROVIDER_KEY_SUFFIX: &str = "provider";

/// Configuration loading or decoding failure.
#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to load configuration: {_0}")]
    Load(#[error(source)] ::config::ConfigError),

    #[display("invalid value for '{key}': {source}")]
    Invalid {
        key: String,
        source: ::config::ConfigError,
    },
}

/// Merged, read-only runtime configuration.
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    inner: Config,
}

impl RuntimeConfig {
    /// Configuration with no keys; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder {
            inner: Config::builder(),
        }
    }

    /// Loads a single file; the format is inferred from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::builder().add_file(path).build()
    }

    /// Loads a TOML document, mostly useful in tests.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::builder().add_toml_str(content).build()
    }

    /// Reads `PREFIX__SECTION__KEY` style environment variables.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::builder().add_env(prefix).build()
    }

    /// Returns the string at `key`, or `None` if the key is absent or not a string.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.inner.get_string(key).ok()
    }

    /// Deserializes the value at `key`; `Ok(None)` when the key is absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.inner.get::<T>(key) {
            Ok(value) => Ok(Some(value)),
            Err(::config::ConfigError::NotFound(_)) => Ok(None),
            Err(source) => Err(ConfigError::Invalid {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Deserializes the value at `key`, falling back to `default` when absent.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Provider alias configured for `capability` under `"<capability>.provider"`.
    pub fn provider_alias(&self, capability: &str) -> String {
        self.get_string(&Self::provider_key(capability))
            .unwrap_or_else(|| DEFAULT_PROVIDER_ALIAS.to_string())
    }

    pub fn provider_key(capability: &str) -> String {
        format!("{}.{}", capability, PROVIDER_KEY_SUFFIX)
    }
}

/// Layered builder; later sources override earlier ones.
pub struct RuntimeConfigBuilder {
    inner: ConfigBuilder<DefaultState>,
}

impl RuntimeConfigBuilder {
    pub fn add_file(mut self, path: impl AsRef<Path>) -> Self {
        self.inner = self.inner.add_source(File::from(path.as_ref()));
        self
    }

    /// Like [`add_file`](Self::add_file), but a missing file is skipped.
    pub fn add_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        self.inner = self.inner.add_source(File::from(path.as_ref()).required(false));
        self
    }

    pub fn add_toml_str(mut self, content: &str) -> Self {
        self.inner = self
            .inner
            .add_source(File::from_str(content, FileFormat::Toml));
        self
    }

    pub fn add_env(mut self, prefix: &str) -> Self {
        self.inner = self
            .inner
            .add_source(Environment::with_prefix(prefix).separator("__"));
        self
    }

    /// Sets a single value, overriding every source.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Result<Self, ConfigError> {
        self.inner = self.inner.set_override(key, value).map_err(ConfigError::Load)?;
        Ok(self)
    }

    pub fn build(self) -> Result<RuntimeConfig, ConfigError> {
        let inner = self.inner.build().map_err(ConfigError::Load)?;
        Ok(RuntimeConfig { inner })
    }
}
