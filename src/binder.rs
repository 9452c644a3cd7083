//! Fluent binding API.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::Container;
use crate::error::DiResult;
use crate::key::Key;
use crate::registration::{erase, Concrete, ErasedFactory};
use crate::traits::{Construct, Provides};

/// Pending binding for the abstract type `I`, returned by
/// [`Container::bind`].
///
/// Exactly one terminal operation must be called to record the binding.
/// Bindings that construct values (`to_transient`, `to_singleton`,
/// `to_scoped`) check the concrete type's constructor parameters for
/// dependency cycles first; a rejected binding leaves the container
/// unchanged.
///
/// ```rust
/// use scopewire::{constructor, provides, Container, Lifetime};
///
/// trait Store: Send + Sync {}
///
/// struct MemoryStore;
/// impl Store for MemoryStore {}
/// provides!(MemoryStore => dyn Store);
/// constructor!(MemoryStore => MemoryStore::new());
///
/// impl MemoryStore {
///     fn new() -> Self {
///         MemoryStore
///     }
/// }
///
/// let mut container = Container::new();
/// container.bind::<dyn Store>().unwrap().to_scoped::<MemoryStore>().unwrap();
/// assert_eq!(container.lifetime_of::<dyn Store>(), Some(Lifetime::Scoped));
/// ```
#[must_use = "a binding is only recorded by one of its `to_*` methods"]
pub struct Binder<'c, I: ?Sized> {
    container: &'c mut Container,
    _abstract: PhantomData<fn(Arc<I>)>,
}

impl<'c, I> Binder<'c, I>
where
    I: ?Sized + Send + Sync + 'static,
{
    pub(crate) fn new(container: &'c mut Container) -> Self {
        Self {
            container,
            _abstract: PhantomData,
        }
    }

    /// Binds `I` to a pre-built value. Every request returns the same one.
    pub fn to_instance<C>(self, value: C) -> DiResult<()>
    where
        C: Provides<I>,
    {
        let shared = <C as Provides<I>>::provide(Arc::new(value));
        self.container
            .register_instance(Key::of::<I>(), erase(shared), std::any::type_name::<C>())
    }

    /// Binds `I` to a value that is already shared.
    pub fn to_shared_instance(self, value: Arc<I>) -> DiResult<()> {
        self.container
            .register_instance(Key::of::<I>(), erase(value), std::any::type_name::<I>())
    }

    /// Binds `I` to `C`, constructed afresh on every request.
    pub fn to_transient<C>(self) -> DiResult<()>
    where
        C: Construct + Provides<I>,
    {
        self.container
            .register_transient(Key::of::<I>(), Concrete::of::<C, I>())
    }

    /// Binds `I` to `C`, constructed on first request and shared after that.
    pub fn to_singleton<C>(self) -> DiResult<()>
    where
        C: Construct + Provides<I>,
    {
        self.container
            .register_singleton(Key::of::<I>(), Concrete::of::<C, I>())
    }

    /// Binds `I` to the value `factory` returns on first request, shared
    /// after that. The factory runs at most once.
    ///
    /// ```rust
    /// use scopewire::Container;
    /// use std::sync::Arc;
    ///
    /// struct Settings {
    ///     retries: u32,
    /// }
    ///
    /// let mut container = Container::new();
    /// container
    ///     .bind::<Settings>()
    ///     .unwrap()
    ///     .to_singleton_factory(|| Settings { retries: 3 })
    ///     .unwrap();
    ///
    /// let a = container.resolve::<Settings>().unwrap();
    /// let b = container.resolve::<Settings>().unwrap();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// assert_eq!(a.retries, 3);
    /// ```
    pub fn to_singleton_factory<C, F>(self, factory: F) -> DiResult<()>
    where
        C: Provides<I>,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let erased: ErasedFactory =
            Arc::new(move || erase(<C as Provides<I>>::provide(Arc::new(factory()))));
        self.container
            .register_singleton_factory(Key::of::<I>(), std::any::type_name::<C>(), erased)
    }

    /// Binds `I` to `C`, constructed once per active scope.
    pub fn to_scoped<C>(self) -> DiResult<()>
    where
        C: Construct + Provides<I>,
    {
        self.container
            .register_scoped(Key::of::<I>(), Concrete::of::<C, I>())
    }

    /// Declares `I` as a scope context: its value is whatever object the
    /// active scope was begun with, through
    /// [`Container::begin_scope_with_context`]. The declaration outlives
    /// individual scopes.
    pub fn as_scope_context(self) -> DiResult<()> {
        self.container.register_scope_context(Key::of::<I>())
    }
}
