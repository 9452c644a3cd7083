//! Per-thread scope stacks and the RAII scope guard.

use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::AnyArc;
use crate::resolvers::ContextBindings;

use super::Container;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(0);

// Open frames of the current thread, per owning container. Dropped with the
// thread, which releases whatever scopes it left open.
thread_local! {
    static SCOPE_TLS: RefCell<HashMap<u64, ThreadScopes>> = RefCell::new(HashMap::new());
}

/// One active scope: the scoped instances built in it, plus the context
/// object it was begun with, if any.
pub(crate) struct ScopeFrame {
    cache: HashMap<Key, AnyArc>,
    context: Option<(Key, AnyArc)>,
}

impl ScopeFrame {
    pub(crate) fn new() -> Self {
        Self {
            cache: HashMap::new(),
            context: None,
        }
    }

    pub(crate) fn with_context(key: Key, context: AnyArc) -> Self {
        Self {
            cache: HashMap::new(),
            context: Some((key, context)),
        }
    }

    pub(crate) fn context_key(&self) -> Option<Key> {
        self.context.as_ref().map(|(key, _)| *key)
    }

    pub(crate) fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// One thread's stack for one container.
struct ThreadScopes {
    frames: Vec<ScopeFrame>,
    contexts: Weak<ContextBindings>,
}

impl Drop for ThreadScopes {
    fn drop(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        debug!(abandoned = self.frames.len(), "releasing scopes left open");
        let Some(contexts) = self.contexts.upgrade() else {
            return;
        };
        for key in self.frames.iter().filter_map(ScopeFrame::context_key) {
            contexts.detach(&key);
        }
    }
}

/// LIFO stacks of scope frames, one per thread.
///
/// Frames live in thread-local storage, so a frame begun on one thread is
/// invisible to every other thread. Frames a thread never ends are released
/// when it exits, together with the context bindings they kept alive.
/// Dropping the container releases the calling thread's frames; other
/// threads release theirs when they exit.
pub(crate) struct ScopeStacks {
    owner: u64,
    contexts: Weak<ContextBindings>,
}

impl ScopeStacks {
    pub(crate) fn new(contexts: &Arc<ContextBindings>) -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            contexts: Arc::downgrade(contexts),
        }
    }

    /// Pushes a frame on the calling thread's stack; returns the new depth.
    pub(crate) fn push(&self, frame: ScopeFrame) -> usize {
        SCOPE_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();
            let scopes = tls.entry(self.owner).or_insert_with(|| ThreadScopes {
                frames: Vec::new(),
                contexts: self.contexts.clone(),
            });
            scopes.frames.push(frame);
            scopes.frames.len()
        })
    }

    /// Pops the calling thread's top frame.
    pub(crate) fn pop(&self) -> DiResult<ScopeFrame> {
        SCOPE_TLS
            .try_with(|tls| {
                let mut tls = tls.borrow_mut();
                let scopes = tls.get_mut(&self.owner)?;
                let frame = scopes.frames.pop()?;
                if scopes.frames.is_empty() {
                    tls.remove(&self.owner);
                }
                Some(frame)
            })
            .ok()
            .flatten()
            .ok_or(DiError::NoActiveScope)
    }

    pub(crate) fn depth(&self) -> usize {
        SCOPE_TLS
            .try_with(|tls| tls.borrow().get(&self.owner).map_or(0, |scopes| scopes.frames.len()))
            .unwrap_or(0)
    }

    fn with_top<R>(&self, f: impl FnOnce(&mut ScopeFrame) -> R) -> DiResult<R> {
        SCOPE_TLS
            .try_with(|tls| {
                tls.borrow_mut()
                    .get_mut(&self.owner)
                    .and_then(|scopes| scopes.frames.last_mut())
                    .map(f)
            })
            .ok()
            .flatten()
            .ok_or(DiError::NoActiveScope)
    }

    /// Instance cached for `key` in the top frame.
    pub(crate) fn cached(&self, key: &Key) -> DiResult<Option<AnyArc>> {
        self.with_top(|frame| frame.cache.get(key).cloned())
    }

    /// Caches `value` in the top frame. A value stored first wins and is
    /// returned instead.
    pub(crate) fn store(&self, key: Key, value: AnyArc) -> DiResult<AnyArc> {
        self.with_top(|frame| frame.cache.entry(key).or_insert_with(|| value.clone()).clone())
    }

    /// Context for `key` carried by the top frame.
    pub(crate) fn context(&self, key: &Key) -> Option<AnyArc> {
        self.with_top(|frame| match &frame.context {
            Some((context_key, value)) if context_key == key => Some(value.clone()),
            _ => None,
        })
        .ok()
        .flatten()
    }
}

impl Drop for ScopeStacks {
    fn drop(&mut self) {
        // Taken out first: cached instances must not drop under the borrow.
        let abandoned = SCOPE_TLS
            .try_with(|tls| tls.borrow_mut().remove(&self.owner))
            .ok()
            .flatten();
        drop(abandoned);
    }
}

/// Ends its scope when dropped.
///
/// Returned by [`Container::scope`] and [`Container::scope_with_context`].
/// The guard is tied to the thread that began the scope and cannot be sent
/// elsewhere. Ending scopes manually with [`Container::end_scope`] while a
/// guard is alive breaks the pairing; the guard would then end an outer
/// scope.
///
/// ```rust
/// use scopewire::Container;
///
/// let container = Container::new();
/// {
///     let _scope = container.scope();
///     assert_eq!(container.scope_depth(), 1);
/// }
/// assert_eq!(container.scope_depth(), 0);
/// ```
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard<'c> {
    container: &'c Container,
    ended: bool,
    _not_send: PhantomData<*const ()>,
}

impl<'c> ScopeGuard<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self {
            container,
            ended: false,
            _not_send: PhantomData,
        }
    }

    /// Ends the scope now, reporting any error.
    pub fn end(mut self) -> DiResult<()> {
        self.ended = true;
        self.container.end_scope()
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if let Err(err) = self.container.end_scope() {
            debug!(error = %err, "scope guard could not end its scope");
        }
    }
}
