//! Singleton resolution with at-most-once construction.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Concrete, ErasedFactory};
use crate::traits::LifetimeResolver;

enum SingletonSource {
    Concrete(Concrete),
    Factory {
        implementation: &'static str,
        factory: ErasedFactory,
    },
}

struct SingletonSlot {
    source: SingletonSource,
    // Initialised exactly once; concurrent first requests for the same key
    // block on the cell while one of them constructs.
    cell: OnceCell<AnyArc>,
}

/// Values built on first request and cached for the container's lifetime.
#[derive(Default)]
pub(crate) struct SingletonResolver {
    slots: HashMap<Key, SingletonSlot>,
}

impl SingletonResolver {
    pub(crate) fn register_concrete(&mut self, key: Key, concrete: Concrete) {
        self.insert(key, SingletonSource::Concrete(concrete));
    }

    pub(crate) fn register_factory(&mut self, key: Key, implementation: &'static str, factory: ErasedFactory) {
        self.insert(key, SingletonSource::Factory { implementation, factory });
    }

    fn insert(&mut self, key: Key, source: SingletonSource) {
        self.slots.insert(
            key,
            SingletonSlot {
                source,
                cell: OnceCell::new(),
            },
        );
    }
}

impl LifetimeResolver for SingletonResolver {
    fn lifetime(&self) -> Lifetime {
        Lifetime::Singleton
    }

    fn resolve(&self, key: &Key, container: &Container) -> DiResult<AnyArc> {
        let slot = self
            .slots
            .get(key)
            .ok_or(DiError::Unregistered(key.display_name()))?;

        // Fast path: already built
        if let Some(value) = slot.cell.get() {
            return Ok(value.clone());
        }

        // A failed construction leaves the cell empty for the next caller.
        slot.cell
            .get_or_try_init(|| match &slot.source {
                SingletonSource::Concrete(concrete) => container.construct(key, concrete),
                SingletonSource::Factory { factory, .. } => Ok(factory()),
            })
            .map(Arc::clone)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.slots.contains_key(key)
    }

    fn registered_keys(&self) -> Vec<Key> {
        self.slots.keys().copied().collect()
    }

    fn implementation_of(&self, key: &Key) -> Option<&'static str> {
        self.slots.get(key).map(|slot| match &slot.source {
            SingletonSource::Concrete(concrete) => concrete.name,
            SingletonSource::Factory { implementation, .. } => *implementation,
        })
    }
}
