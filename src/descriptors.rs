//! Service descriptors for introspection and diagnostics.

use std::fmt;

use crate::key::Key;
use crate::lifetime::Lifetime;

/// Service descriptor for introspection and diagnostics
///
/// One descriptor exists per binding in the container. Descriptors are
/// snapshots: later registrations or scope changes do not update them.
///
/// # Examples
///
/// ```rust
/// use scopewire::{constructor, Container, Key, Lifetime};
/// use std::sync::Arc;
///
/// struct Database;
/// struct Repository {
///     db: Arc<Database>,
/// }
///
/// impl Repository {
///     fn new(db: Arc<Database>) -> Self {
///         Repository { db }
///     }
/// }
///
/// constructor!(Repository => Repository::new(Database));
///
/// let mut container = Container::new();
/// container.bind::<Database>().unwrap().to_instance(Database).unwrap();
/// container.bind::<Repository>().unwrap().to_scoped::<Repository>().unwrap();
///
/// let descriptors = container.descriptors();
/// let repo = descriptors.iter().find(|d| d.type_name().ends_with("Repository")).unwrap();
/// assert_eq!(repo.lifetime, Lifetime::Scoped);
/// assert_eq!(repo.dependencies, vec![Key::of::<Database>()]);
///
/// let db = descriptors.iter().find(|d| d.type_name().ends_with("Database")).unwrap();
/// assert_eq!(db.lifetime, Lifetime::Instance);
/// assert!(db.dependencies.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// The abstract type
    pub key: Key,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// Concrete type name, when the binding has a fixed one
    pub implementation: Option<&'static str>,
    /// Constructor parameter types, in order
    pub dependencies: Vec<Key>,
}

impl ServiceDescriptor {
    pub(crate) fn new(
        key: Key,
        lifetime: Lifetime,
        implementation: Option<&'static str>,
        dependencies: Vec<Key>,
    ) -> Self {
        Self {
            key,
            lifetime,
            implementation,
            dependencies,
        }
    }

    /// Name of the abstract type.
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// Whether values are built through a constructor
    pub fn is_constructed(&self) -> bool {
        self.lifetime.is_constructed()
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.type_name(), self.lifetime)?;
        if let Some(implementation) = self.implementation {
            write!(f, " => {implementation}")?;
        }
        if !self.dependencies.is_empty() {
            let names: Vec<&str> = self.dependencies.iter().map(Key::display_name).collect();
            write!(f, " <- [{}]", names.join(", "))?;
        }
        Ok(())
    }
}
