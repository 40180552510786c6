//! Registry error types.

use derive_more::{Display, Error};

use crate::provider::ProviderError;

/// Errors raised while registering, building or looking up components.
///
/// All of these are configuration errors: they are meant to abort startup,
/// never to surface on a request path.
#[derive(Debug, Display, Error)]
pub enum RegistryError {
    /// `get` on a key that has no entry at all.
    #[display("component {key} is not registered")]
    NotRegistered { key: String },

    /// `get` on a key whose factory has not produced an instance yet.
    #[display("component {key} is registered but not initialized")]
    NotInitialized { key: String },

    /// `override_factory` after the component was built.
    #[display("component {key} is already initialized; overrides must be installed before startup")]
    AlreadyInitialized { key: String },

    /// A second `init` for a built component under [`RegistryPolicy::RejectDuplicates`].
    ///
    /// [`RegistryPolicy::RejectDuplicates`]: crate::registry::RegistryPolicy::RejectDuplicates
    #[display("component {key} was registered twice")]
    DuplicateRegistrationConflict { key: String },

    /// A component depends on itself, directly or through other components.
    #[display("dependency cycle while constructing components: {path}")]
    CycleDetected { path: String },

    /// The key names a different type than the one requested.
    #[display("component {key} cannot be accessed as {requested}")]
    TypeMismatch { key: String, requested: &'static str },

    /// A provider-backed factory could not build its instance.
    #[display("{_0}")]
    Provider(#[error(source)] ProviderError),

    /// Any other constructor failure.
    #[display("failed to construct component {key}: {message}")]
    Construction { key: String, message: String },
}

impl From<ProviderError> for RegistryError {
    fn from(error: ProviderError) -> Self {
        RegistryError::Provider(error)
    }
}
