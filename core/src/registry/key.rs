//! Registry slot identity.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a registry slot: a type plus an optional qualifier.
///
/// The qualifier lets several instances of the same type coexist, e.g. one
/// registry per sub-application. Equality and hashing only look at the type id
/// and the qualifier; the type name is kept for diagnostics.
///
/// # Example
/// ```
/// use warden_core::registry::ComponentKey;
///
/// let a = ComponentKey::of::<String>();
/// let b = ComponentKey::named::<String>("admin");
///
/// assert_ne!(a, b);
/// assert_eq!(b, ComponentKey::named::<String>("admin"));
/// ```
#[derive(Clone, Debug)]
pub struct ComponentKey {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<String>,
}

impl ComponentKey {
    /// Key for the unqualified slot of `T`. `T` may be a trait object.
    pub fn of<T: ?Sized + 'static>() -> Self {
        ComponentKey {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            qualifier: None,
        }
    }

    /// Key for a qualified slot of `T`.
    pub fn named<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        ComponentKey {
            qualifier: Some(qualifier.into()),
            ..Self::of::<T>()
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub(crate) fn is_for<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}[{}]", self.type_name, qualifier),
            None => f.write_str(self.type_name),
        }
    }
}
