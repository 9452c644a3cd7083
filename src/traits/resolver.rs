//! Per-lifetime resolver contract.

use crate::container::Container;
use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::AnyArc;

/// Resolver answering requests for every key registered under one lifetime.
///
/// The container keeps one resolver per [`Lifetime`] and dispatches to it
/// after looking up a key's tag. Resolvers call back into the container to
/// resolve constructor parameters, so `resolve` must not hold any lock of its
/// own while constructing.
pub(crate) trait LifetimeResolver: Send + Sync {
    /// Lifetime this resolver is responsible for.
    fn lifetime(&self) -> Lifetime;

    /// Produces the value for `key` according to the resolver's caching policy.
    fn resolve(&self, key: &Key, container: &Container) -> DiResult<AnyArc>;

    /// Whether `key` has a binding in this resolver.
    fn is_registered(&self, key: &Key) -> bool;

    /// Every key bound in this resolver.
    fn registered_keys(&self) -> Vec<Key>;

    /// Name of the concrete type behind `key`, when the resolver knows one.
    fn implementation_of(&self, _key: &Key) -> Option<&'static str> {
        None
    }
}
