//! Service lifetime definitions.

use std::fmt;

/// Lifetime tag recorded for every registered abstract type.
///
/// The tag decides which resolver answers a request for the type and
/// therefore how instances are reused. A type carries exactly one tag for as
/// long as it stays registered.
///
/// # Examples
///
/// ```rust
/// use scopewire::{Container, Construct, Arguments, ConstructError, Key, Lifetime};
///
/// #[derive(Default)]
/// struct Clock;
///
/// impl Construct for Clock {
///     fn parameters() -> Vec<Key> {
///         Vec::new()
///     }
///
///     fn construct(_args: Arguments) -> Result<Self, ConstructError> {
///         Ok(Clock)
///     }
/// }
///
/// let mut container = Container::new();
/// container.bind::<Clock>().unwrap().to_singleton::<Clock>().unwrap();
///
/// assert_eq!(container.lifetime_of::<Clock>(), Some(Lifetime::Singleton));
/// assert_eq!(container.lifetime_of::<String>(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "graph-export", derive(serde::Serialize))]
pub enum Lifetime {
    /// A pre-built value handed out unchanged on every request.
    Instance,
    /// A new instance per resolution, never cached.
    Transient,
    /// Constructed once on first request and cached for the container's
    /// lifetime.
    Singleton,
    /// Constructed once per scope frame and dropped with the frame.
    ///
    /// Resolving a scoped type without an active scope fails with
    /// [`DiError::NoActiveScope`](crate::DiError::NoActiveScope).
    Scoped,
    /// Resolves to the context object supplied when the active scope began.
    ScopeContext,
}

impl Lifetime {
    /// Whether bindings with this lifetime are built through a constructor
    /// and therefore take part in cycle detection.
    pub fn is_constructed(self) -> bool {
        matches!(self, Lifetime::Transient | Lifetime::Singleton | Lifetime::Scoped)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifetime::Instance => "instance",
            Lifetime::Transient => "transient",
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::ScopeContext => "scope context",
        };
        f.write_str(name)
    }
}
