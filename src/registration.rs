//! Service registration types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::traits::{Arguments, Construct, ConstructError, Provides};

// Type-erased Arc for storage. The payload is always an `Arc<I>` for the
// abstract type `I` it was stored under.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type ErasedCtor = Arc<dyn Fn(Arguments) -> Result<AnyArc, ConstructError> + Send + Sync>;
pub(crate) type ErasedFactory = Arc<dyn Fn() -> AnyArc + Send + Sync>;

#[inline(always)]
pub(crate) fn erase<I: ?Sized + Send + Sync + 'static>(value: Arc<I>) -> AnyArc {
    Arc::new(value)
}

#[inline(always)]
pub(crate) fn downcast_arc<I: ?Sized + Send + Sync + 'static>(value: &AnyArc) -> Option<Arc<I>> {
    value.downcast_ref::<Arc<I>>().cloned()
}

/// Concrete type descriptor: what to build and what it needs.
pub(crate) struct Concrete {
    pub(crate) name: &'static str,
    pub(crate) parameters: Vec<Key>,
    ctor: ErasedCtor,
}

impl Concrete {
    /// Descriptor building `C` and storing it as the abstract type `I`.
    pub(crate) fn of<C, I>() -> Self
    where
        C: Construct + Provides<I>,
        I: ?Sized + Send + Sync + 'static,
    {
        let ctor = |args: Arguments| -> Result<AnyArc, ConstructError> {
            let value = C::construct(args)?;
            Ok(erase(<C as Provides<I>>::provide(Arc::new(value))))
        };
        Self {
            name: std::any::type_name::<C>(),
            parameters: C::parameters(),
            ctor: Arc::new(ctor),
        }
    }

    pub(crate) fn build(&self, args: Arguments) -> Result<AnyArc, ConstructError> {
        (self.ctor)(args)
    }
}

/// Lifetime map: one tag per type bound through the binder. Context
/// bindings introduced by open scopes are tracked by the scopes instead.
#[derive(Default)]
pub(crate) struct Registry {
    lifetimes: HashMap<Key, Lifetime>,
}

impl Registry {
    #[inline(always)]
    pub(crate) fn lifetime(&self, key: &Key) -> Option<Lifetime> {
        self.lifetimes.get(key).copied()
    }

    /// Fails if `key` already carries a tag.
    pub(crate) fn ensure_unbound(&self, key: &Key) -> DiResult<()> {
        match self.lifetime(key) {
            Some(lifetime) => Err(DiError::AlreadyRegistered {
                service: key.display_name(),
                lifetime,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn insert(&mut self, key: Key, lifetime: Lifetime) -> DiResult<()> {
        self.ensure_unbound(&key)?;
        self.lifetimes.insert(key, lifetime);
        Ok(())
    }
}
