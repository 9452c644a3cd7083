//! Per-lifetime resolvers.
//!
//! One resolver exists per [`Lifetime`]; the container looks up a key's tag
//! and hands the request to the matching resolver. Instance and transient
//! bindings live here, the caching resolvers in their own modules.

use std::collections::HashMap;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Concrete};
use crate::traits::LifetimeResolver;

mod scoped;
mod singleton;

pub(crate) use scoped::{ContextBindings, ScopeContextResolver, ScopedResolver};
pub(crate) use singleton::SingletonResolver;

struct InstanceBinding {
    value: AnyArc,
    implementation: &'static str,
}

/// Pre-built values, handed out unchanged.
#[derive(Default)]
pub(crate) struct InstanceResolver {
    bindings: HashMap<Key, InstanceBinding>,
}

impl InstanceResolver {
    pub(crate) fn register(&mut self, key: Key, value: AnyArc, implementation: &'static str) {
        self.bindings.insert(key, InstanceBinding { value, implementation });
    }
}

impl LifetimeResolver for InstanceResolver {
    fn lifetime(&self) -> Lifetime {
        Lifetime::Instance
    }

    fn resolve(&self, key: &Key, _container: &Container) -> DiResult<AnyArc> {
        self.bindings
            .get(key)
            .map(|binding| binding.value.clone())
            .ok_or(DiError::Unregistered(key.display_name()))
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.bindings.contains_key(key)
    }

    fn registered_keys(&self) -> Vec<Key> {
        self.bindings.keys().copied().collect()
    }

    fn implementation_of(&self, key: &Key) -> Option<&'static str> {
        self.bindings.get(key).map(|binding| binding.implementation)
    }
}

/// Concrete types constructed afresh on every request.
#[derive(Default)]
pub(crate) struct TransientResolver {
    bindings: HashMap<Key, Concrete>,
}

impl TransientResolver {
    pub(crate) fn register(&mut self, key: Key, concrete: Concrete) {
        self.bindings.insert(key, concrete);
    }
}

impl LifetimeResolver for TransientResolver {
    fn lifetime(&self) -> Lifetime {
        Lifetime::Transient
    }

    fn resolve(&self, key: &Key, container: &Container) -> DiResult<AnyArc> {
        let concrete = self
            .bindings
            .get(key)
            .ok_or(DiError::Unregistered(key.display_name()))?;
        container.construct(key, concrete)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.bindings.contains_key(key)
    }

    fn registered_keys(&self) -> Vec<Key> {
        self.bindings.keys().copied().collect()
    }

    fn implementation_of(&self, key: &Key) -> Option<&'static str> {
        self.bindings.get(key).map(|concrete| concrete.name)
    }
}
