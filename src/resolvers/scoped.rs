//! Scoped and scope-context resolution.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Concrete};
use crate::traits::LifetimeResolver;

/// Concrete types cached once per scope frame.
#[derive(Default)]
pub(crate) struct ScopedResolver {
    bindings: HashMap<Key, Concrete>,
}

impl ScopedResolver {
    pub(crate) fn register(&mut self, key: Key, concrete: Concrete) {
        self.bindings.insert(key, concrete);
    }
}

impl LifetimeResolver for ScopedResolver {
    fn lifetime(&self) -> Lifetime {
        Lifetime::Scoped
    }

    fn resolve(&self, key: &Key, container: &Container) -> DiResult<AnyArc> {
        let concrete = self
            .bindings
            .get(key)
            .ok_or(DiError::Unregistered(key.display_name()))?;

        let scopes = container.scopes();
        if let Some(cached) = scopes.cached(key)? {
            return Ok(cached);
        }

        // The frame's lock is released while constructing; parameters may be
        // scoped themselves.
        let value = container.construct(key, concrete)?;
        scopes.store(*key, value)
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

#[derive(Debug, Clone, Copy, Default)]
struct ContextBinding {
    /// Declared up front with `as_scope_context()`; never removed.
    declared: bool,
    /// Open frames carrying a context of this type, across all threads.
    active: usize,
}

/// Scope-context bindings and their open-frame counts.
///
/// Shared with the scope stacks so that frames abandoned by an exiting
/// thread can still be detached.
#[derive(Default)]
pub(crate) struct ContextBindings {
    bindings: Mutex<HashMap<Key, ContextBinding>>,
}

impl ContextBindings {
    pub(crate) fn declare(&self, key: Key) {
        self.bindings.lock().entry(key).or_default().declared = true;
    }

    /// A frame carrying a context for `key` was pushed.
    pub(crate) fn attach(&self, key: Key) {
        self.bindings.lock().entry(key).or_default().active += 1;
    }

    /// A frame carrying a context for `key` was popped. Returns `true` when
    /// this removed a binding that only open frames kept alive.
    pub(crate) fn detach(&self, key: &Key) -> bool {
        let mut bindings = self.bindings.lock();
        let Some(binding) = bindings.get_mut(key) else {
            return false;
        };
        binding.active = binding.active.saturating_sub(1);
        if binding.active == 0 && !binding.declared {
            bindings.remove(key);
            return true;
        }
        false
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.bindings.lock().contains_key(key)
    }

    fn keys(&self) -> Vec<Key> {
        self.bindings.lock().keys().copied().collect()
    }
}

/// Context objects supplied by the scopes that are currently open.
#[derive(Default)]
pub(crate) struct ScopeContextResolver {
    bindings: Arc<ContextBindings>,
}

impl ScopeContextResolver {
    pub(crate) fn bindings(&self) -> &Arc<ContextBindings> {
        &self.bindings
    }
}

impl LifetimeResolver for ScopeContextResolver {
    fn lifetime(&self) -> Lifetime {
        Lifetime::ScopeContext
    }

    fn resolve(&self, key: &Key, container: &Container) -> DiResult<AnyArc> {
        container
            .scopes()
            .context(key)
            .ok_or(DiError::Unregistered(key.display_name()))
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.bindings.contains(key)
    }

    fn registered_keys(&self) -> Vec<Key> {
        self.bindings.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attached_binding_goes_away_with_its_last_frame() {
        let resolver = ScopeContextResolver::default();
        let bindings = resolver.bindings();
        let key = Key::of::<u32>();

        bindings.attach(key);
        bindings.attach(key);
        assert!(!bindings.detach(&key));
        assert!(resolver.is_registered(&key));
        assert!(bindings.detach(&key));
        assert!(!resolver.is_registered(&key));
    }

    #[test]
    fn declared_binding_survives_frames() {
        let resolver = ScopeContextResolver::default();
        let bindings = resolver.bindings();
        let key = Key::of::<u32>();

        bindings.declare(key);
        bindings.attach(key);
        assert!(!bindings.detach(&key));
        assert!(resolver.is_registered(&key));
        assert_eq!(resolver.registered_keys(), vec![key]);
    }

    #[test]
    fn detach_unknown_key_is_noop() {
        let bindings = ContextBindings::default();
        assert!(!bindings.detach(&Key::of::<u32>()));
    }
}
