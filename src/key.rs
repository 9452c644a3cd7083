//! Service keys for the dependency injection container.

use std::any::TypeId;
use std::fmt;

/// Key identifying an abstract type in the container.
///
/// Keys are built from the compile-time [`TypeId`] of the requested type, so
/// concrete types and trait objects (`dyn Trait`) are both valid abstract
/// types. The type name is carried along for diagnostics only and never takes
/// part in comparisons.
///
/// # Examples
///
/// ```rust
/// use scopewire::Key;
///
/// trait Logger: Send + Sync {}
///
/// let a = Key::of::<dyn Logger>();
/// let b = Key::of::<dyn Logger>();
/// assert_eq!(a, b);
/// assert!(a.display_name().contains("Logger"));
///
/// assert_ne!(Key::of::<u32>(), Key::of::<u64>());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Key for the abstract type `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Key {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` this key compares by.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name, as reported by `std::any::type_name`.
    pub fn display_name(&self) -> &'static str {
        self.name
    }
}

// TypeId-only comparison; the name is diagnostic.
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Shorthand for [`Key::of`].
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
