//! Type-keyed component registry.
//!
//! Every pluggable piece of the runtime (authentication and access managers,
//! configuration, datasources, HTTP clients...) lives in a [`Registry`] slot
//! identified by a [`ComponentKey`].
//!
//! # Lifecycle
//!
//! - [`Registry::override_factory`] installs a replacement factory before the
//!   component is built (test harnesses substitute fakes this way).
//! - [`Registry::init`] builds the component eagerly, exactly once per key, and
//!   returns the shared instance. Later calls return that same instance.
//! - [`Registry::get`] returns a built instance and never constructs anything.
//!
//! # Concurrency
//!
//! Construction is serialized through one reentrant lock: concurrent first
//! callers for a key observe a single factory invocation, and a factory may
//! call back into the registry from the constructing thread. Lookups only take
//! a read lock on the entry table.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use warden_core::registry::{ComponentKey, Registry};
//!
//! let registry = Registry::new();
//! let key = ComponentKey::of::<String>();
//!
//! let first = registry.init(&key, |_| Ok(Arc::new("primary".to_string()))).unwrap();
//! let again = registry.init(&key, |_| Ok(Arc::new("ignored".to_string()))).unwrap();
//!
//! assert!(Arc::ptr_eq(&first, &again));
//! assert_eq!(registry.get::<String>(&key).unwrap().as_str(), "primary");
//! ```

mod entry;
mod error;
mod key;

use std::any::type_name;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};

pub use entry::{ComponentEntry, ComponentState, OverrideFactory};
pub use error::RegistryError;
pub use key::ComponentKey;

/// What `init` does when the key already holds a built instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegistryPolicy {
    /// Return the existing instance and drop the new factory uncalled.
    #[default]
    ReuseExisting,
    /// Fail with [`RegistryError::DuplicateRegistrationConflict`].
    RejectDuplicates,
}

/// Shared, mostly-read component container.
pub struct Registry {
    name: Option<String>,
    policy: RegistryPolicy,
    entries: RwLock<HashMap<ComponentKey, ComponentEntry>>,
    // keys currently being constructed, innermost last
    construction: ReentrantMutex<RefCell<Vec<ComponentKey>>>,
}

impl Registry {
    /// Creates an empty registry with the [`RegistryPolicy::ReuseExisting`] policy.
    pub fn new() -> Self {
        Self::with_policy(RegistryPolicy::default())
    }

    /// Creates an empty registry tagged with a name, e.g. one per sub-application.
    pub fn named(name: impl Into<String>) -> Self {
        Registry {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    pub fn with_policy(policy: RegistryPolicy) -> Self {
        Registry {
            name: None,
            policy,
            entries: RwLock::new(HashMap::new()),
            construction: ReentrantMutex::new(RefCell::new(Vec::new())),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn policy(&self) -> RegistryPolicy {
        self.policy
    }

    /// Registers `factory` for `key`, builds the component and returns it.
    ///
    /// If the component is already built, the existing instance is returned
    /// and `factory` is dropped without being called (or the call fails under
    /// [`RegistryPolicy::RejectDuplicates`]). Concurrent first callers share
    /// one instance under either policy. If an override factory was installed
    /// for `key`, it is used instead of `factory`.
    ///
    /// # Errors
    /// - [`RegistryError::TypeMismatch`] if `key` was not built for `T`
    /// - [`RegistryError::CycleDetected`] if constructing `key` needs `key`
    /// - whatever the factory returns
    pub fn init<T, F>(&self, key: &ComponentKey, factory: F) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce(&Registry) -> Result<Arc<T>, RegistryError> + Send + 'static,
    {
        Self::check_type::<T>(key)?;

        if let Some(existing) = self.materialized::<T>(key) {
            return self.reuse(key, existing);
        }

        let stack = self.construction.lock();

        // another thread built it while we waited for the lock; we raced it as
        // a first caller, so we share its instance under either policy
        if let Some(existing) = self.materialized::<T>(key) {
            return Ok(existing);
        }

        if let Some(position) = stack.borrow().iter().position(|k| k == key) {
            let path = stack.borrow()[position..]
                .iter()
                .chain(std::iter::once(key))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            tracing::error!(target: "warden::registry", %path, "dependency cycle");
            return Err(RegistryError::CycleDetected { path });
        }

        let overridden = {
            let mut entries = self.entries.write();
            let entry = entries.entry(key.clone()).or_insert_with(ComponentEntry::new);
            entry.mark_registered();
            entry.override_for::<T>()
        };

        let built = {
            let _frame = ConstructionFrame::push(&stack, key.clone());
            match overridden {
                Some(overridden) => {
                    tracing::debug!(target: "warden::registry", %key, "using override factory");
                    overridden(self)
                }
                None => factory(self),
            }
        };

        match built {
            Ok(instance) => {
                if let Some(entry) = self.entries.write().get_mut(key) {
                    entry.materialize(Arc::clone(&instance));
                }
                tracing::debug!(
                    target: "warden::registry",
                    registry = self.name.as_deref().unwrap_or("default"),
                    %key,
                    "component initialized"
                );
                Ok(instance)
            }
            Err(error) => {
                tracing::error!(target: "warden::registry", %key, %error, "component construction failed");
                Err(error)
            }
        }
    }

    /// Returns the built instance for `key`.
    ///
    /// # Errors
    /// - [`RegistryError::NotRegistered`] if nothing was ever registered for `key`
    /// - [`RegistryError::NotInitialized`] if only a factory is known
    /// - [`RegistryError::TypeMismatch`] if `key` was not built for `T`
    pub fn get<T>(&self, key: &ComponentKey) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self::check_type::<T>(key)?;

        let entries = self.entries.read();
        let entry = entries.get(key).ok_or_else(|| RegistryError::NotRegistered {
            key: key.to_string(),
        })?;
        entry.instance::<T>().ok_or_else(|| RegistryError::NotInitialized {
            key: key.to_string(),
        })
    }

    /// Replaces the factory `init` will use for `key`.
    ///
    /// Only valid before the component is built; a later override in the same
    /// pre-init phase replaces an earlier one. The override stays installed
    /// until it succeeds, so an `init` retried after a failure uses it again.
    ///
    /// # Errors
    /// [`RegistryError::AlreadyInitialized`] once the component exists.
    pub fn override_factory<T, F>(&self, key: &ComponentKey, factory: F) -> Result<(), RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Registry) -> Result<Arc<T>, RegistryError> + Send + Sync + 'static,
    {
        Self::check_type::<T>(key)?;

        let mut entries = self.entries.write();
        let entry = entries.entry(key.clone()).or_insert_with(ComponentEntry::new);
        if entry.is_initialized() {
            tracing::warn!(target: "warden::registry", %key, "override rejected, component already initialized");
            return Err(RegistryError::AlreadyInitialized {
                key: key.to_string(),
            });
        }

        entry.install_override::<T>(Arc::new(factory));
        tracing::debug!(target: "warden::registry", %key, "override factory installed");
        Ok(())
    }

    /// Whether `key` holds a built instance.
    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(ComponentEntry::is_initialized)
    }

    pub fn state(&self, key: &ComponentKey) -> ComponentState {
        self.entries
            .read()
            .get(key)
            .map_or(ComponentState::Unregistered, ComponentEntry::state)
    }

    /// Keys of every slot the registry knows about, in no particular order.
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.entries.read().keys().cloned().collect()
    }

    fn materialized<T: ?Sized + Send + Sync + 'static>(&self, key: &ComponentKey) -> Option<Arc<T>> {
        self.entries.read().get(key).and_then(ComponentEntry::instance::<T>)
    }

    fn reuse<T: ?Sized>(&self, key: &ComponentKey, existing: Arc<T>) -> Result<Arc<T>, RegistryError> {
        match self.policy {
            RegistryPolicy::ReuseExisting => Ok(existing),
            RegistryPolicy::RejectDuplicates => Err(RegistryError::DuplicateRegistrationConflict {
                key: key.to_string(),
            }),
        }
    }

    fn check_type<T: ?Sized + 'static>(key: &ComponentKey) -> Result<(), RegistryError> {
        if key.is_for::<T>() {
            Ok(())
        } else {
            Err(RegistryError::TypeMismatch {
                key: key.to_string(),
                requested: type_name::<T>(),
            })
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("components", &self.entries.read().len())
            .finish()
    }
}

/// Pops its key off the construction stack even if the factory panics.
struct ConstructionFrame<'a> {
    stack: &'a RefCell<Vec<ComponentKey>>,
}

impl<'a> ConstructionFrame<'a> {
    fn push(stack: &'a RefCell<Vec<ComponentKey>>, key: ComponentKey) -> Self {
        stack.borrow_mut().push(key);
        ConstructionFrame { stack }
    }
}

impl Drop for ConstructionFrame<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}
