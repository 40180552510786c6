//! Registry slot contents and lifecycle.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::registry::{Registry, RegistryError};

/// Replacement constructor installed by [`Registry::override_factory`].
///
/// It stays installed until the component is built, so a failed attempt can
/// be retried with the same override. The registry is handed in so a
/// constructor can pull its own dependencies through [`Registry::get`] or
/// [`Registry::init`].
pub type OverrideFactory<T> = Arc<dyn Fn(&Registry) -> Result<Arc<T>, RegistryError> + Send + Sync>;

/// Lifecycle of a registry slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentState {
    /// No factory and no instance.
    Unregistered,
    /// A factory is known (override installed, or construction pending/failed).
    Registered,
    /// The instance has been built and is shared from now on.
    Initialized,
}

/// Owner of one component: its pending override and, once built, its instance.
///
/// The instance is stored as a type-erased `Arc<T>`; consumers only ever get
/// clones of that `Arc`.
pub struct ComponentEntry {
    overridden: Option<Box<dyn Any + Send + Sync>>,
    instance: Option<Box<dyn Any + Send + Sync>>,
    state: ComponentState,
}

impl ComponentEntry {
    pub(crate) fn new() -> Self {
        ComponentEntry {
            overridden: None,
            instance: None,
            state: ComponentState::Unregistered,
        }
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == ComponentState::Initialized
    }

    pub(crate) fn instance<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.instance.as_ref()?.downcast_ref::<Arc<T>>().cloned()
    }

    pub(crate) fn install_override<T: ?Sized + Send + Sync + 'static>(&mut self, factory: OverrideFactory<T>) {
        self.overridden = Some(Box::new(factory));
        self.state = ComponentState::Registered;
    }

    /// The installed override for `T`; it is left in place.
    pub(crate) fn override_for<T: ?Sized + Send + Sync + 'static>(&self) -> Option<OverrideFactory<T>> {
        self.overridden.as_ref()?.downcast_ref::<OverrideFactory<T>>().cloned()
    }

    pub(crate) fn mark_registered(&mut self) {
        if self.state == ComponentState::Unregistered {
            self.state = ComponentState::Registered;
        }
    }

    pub(crate) fn materialize<T: ?Sized + Send + Sync + 'static>(&mut self, instance: Arc<T>) {
        self.overridden = None;
        self.instance = Some(Box::new(instance));
        self.state = ComponentState::Initialized;
    }
}

impl fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("state", &self.state)
            .field("overridden", &self.overridden.is_some())
            .finish()
    }
}
