//! Provider loading error types.

use derive_more::{Display, Error};

use crate::settings::ConfigError;

/// Errors raised while resolving a provider alias into an instance.
///
/// These are packaging or configuration defects and must abort startup.
#[derive(Debug, Display, Error)]
pub enum ProviderError {
    /// No descriptor of the capability carries the alias.
    #[display("no {capability} provider registered under alias '{alias}'")]
    UnknownProvider {
        capability: &'static str,
        alias: String,
    },

    /// Two or more descriptors of the capability carry the alias.
    #[display("alias '{alias}' is registered by {count} {capability} providers")]
    AmbiguousProvider {
        capability: &'static str,
        alias: String,
        count: usize,
    },

    /// The provider rejected its configuration.
    #[display("invalid configuration for {capability} provider '{alias}': {reason}")]
    InvalidConfig {
        capability: &'static str,
        alias: String,
        reason: String,
    },

    #[display("{_0}")]
    Config(#[error(source)] ConfigError),
}

impl From<ConfigError> for ProviderError {
    fn from(error: ConfigError) -> Self {
        ProviderError::Config(error)
    }
}
