//! The container: registry, dispatch to the lifetime resolvers, scope
//! control and introspection.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::binder::Binder;
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::graph_export::GraphSnapshot;
use crate::internal::DependencyGraph;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{downcast_arc, erase, AnyArc, Concrete, ErasedFactory, Registry};
use crate::resolvers::{
    InstanceResolver, ScopeContextResolver, ScopedResolver, SingletonResolver, TransientResolver,
};
use crate::traits::{Arguments, InjectFields, LifetimeResolver, Resolved};

mod scope;

pub use scope::ScopeGuard;
pub(crate) use scope::{ScopeFrame, ScopeStacks};

/// Dependency injection container.
///
/// A container maps abstract types to construction strategies and builds
/// fully wired object graphs on request. Each abstract type is bound exactly
/// once, under one [`Lifetime`]:
///
/// - **Instance**: a pre-built value, returned as is
/// - **Transient**: a new value on every request
/// - **Singleton**: built on first request, then shared
/// - **Scoped**: built once per active scope on the calling thread
/// - **Scope context**: the object the active scope was begun with
///
/// Bindings that construct values record their constructor parameters and
/// are rejected when they would close a dependency cycle, so resolution
/// always terminates.
///
/// Registration needs `&mut Container`; once configured, the container can be
/// shared (for example in an `Arc`) and resolved from any number of threads.
///
/// # Examples
///
/// ```rust
/// use scopewire::{constructor, provides, Container};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, message: &str) -> String;
/// }
///
/// struct ConsoleLogger;
///
/// impl Logger for ConsoleLogger {
///     fn log(&self, message: &str) -> String {
///         format!("[console] {message}")
///     }
/// }
///
/// impl ConsoleLogger {
///     fn new() -> Self {
///         ConsoleLogger
///     }
/// }
///
/// struct UserService {
///     logger: Arc<dyn Logger>,
/// }
///
/// impl UserService {
///     fn new(logger: Arc<dyn Logger>) -> Self {
///         UserService { logger }
///     }
/// }
///
/// constructor!(ConsoleLogger => ConsoleLogger::new());
/// constructor!(UserService => UserService::new(dyn Logger));
/// provides!(ConsoleLogger => dyn Logger);
///
/// let mut container = Container::new();
/// container.bind::<dyn Logger>().unwrap().to_singleton::<ConsoleLogger>().unwrap();
/// container.bind::<UserService>().unwrap().to_transient::<UserService>().unwrap();
///
/// let service = container.resolve::<UserService>().unwrap();
/// let logger = container.resolve::<dyn Logger>().unwrap();
/// assert!(Arc::ptr_eq(&service.logger, &logger));
/// assert_eq!(service.logger.log("hi"), "[console] hi");
/// ```
pub struct Container {
    registry: Registry,
    graph: DependencyGraph,
    instances: InstanceResolver,
    transients: TransientResolver,
    singletons: SingletonResolver,
    scoped: ScopedResolver,
    contexts: ScopeContextResolver,
    scopes: ScopeStacks,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registered_types().len())
            .field("scope_depth", &self.scope_depth())
            .finish()
    }
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Self {
        let contexts = ScopeContextResolver::default();
        let scopes = ScopeStacks::new(contexts.bindings());
        Self {
            registry: Registry::default(),
            graph: DependencyGraph::default(),
            instances: InstanceResolver::default(),
            transients: TransientResolver::default(),
            singletons: SingletonResolver::default(),
            scoped: ScopedResolver::default(),
            contexts,
            scopes,
        }
    }

    /// Starts a binding for the abstract type `I`.
    ///
    /// Fails with [`DiError::AlreadyRegistered`] if `I` is already bound; the
    /// existing binding is left untouched.
    ///
    /// ```rust
    /// use scopewire::{Container, DiError, Lifetime};
    ///
    /// let mut container = Container::new();
    /// container.bind::<u32>().unwrap().to_instance(7u32).unwrap();
    ///
    /// match container.bind::<u32>() {
    ///     Err(DiError::AlreadyRegistered { lifetime, .. }) => assert_eq!(lifetime, Lifetime::Instance),
    ///     _ => unreachable!(),
    /// }
    /// assert_eq!(*container.resolve::<u32>().unwrap(), 7);
    /// ```
    pub fn bind<I>(&mut self) -> DiResult<Binder<'_, I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.ensure_unbound(&Key::of::<I>())?;
        Ok(Binder::new(self))
    }

    /// Lifetime of `key`, including context bindings introduced by open
    /// scopes.
    fn lifetime_of_key(&self, key: &Key) -> Option<Lifetime> {
        self.registry
            .lifetime(key)
            .or_else(|| self.contexts.is_registered(key).then_some(Lifetime::ScopeContext))
    }

    fn ensure_unbound(&self, key: &Key) -> DiResult<()> {
        match self.lifetime_of_key(key) {
            Some(lifetime) => Err(DiError::AlreadyRegistered {
                service: key.display_name(),
                lifetime,
            }),
            None => Ok(()),
        }
    }

    /// Records `key` under `lifetime`, with its constructor edges when it
    /// has any. Nothing changes if either step fails.
    fn admit(&mut self, key: Key, lifetime: Lifetime, dependencies: Option<Vec<Key>>) -> DiResult<()> {
        self.ensure_unbound(&key)?;
        if let Some(dependencies) = dependencies {
            self.graph.register(key, dependencies)?;
        }
        self.registry.insert(key, lifetime)
    }

    pub(crate) fn register_instance(&mut self, key: Key, value: AnyArc, implementation: &'static str) -> DiResult<()> {
        self.admit(key, Lifetime::Instance, None)?;
        self.instances.register(key, value, implementation);
        debug!(service = key.display_name(), implementation, "registered instance");
        Ok(())
    }

    pub(crate) fn register_transient(&mut self, key: Key, concrete: Concrete) -> DiResult<()> {
        self.admit(key, Lifetime::Transient, Some(concrete.parameters.clone()))?;
        debug!(service = key.display_name(), implementation = concrete.name, "registered transient");
        self.transients.register(key, concrete);
        Ok(())
    }

    pub(crate) fn register_singleton(&mut self, key: Key, concrete: Concrete) -> DiResult<()> {
        self.admit(key, Lifetime::Singleton, Some(concrete.parameters.clone()))?;
        debug!(service = key.display_name(), implementation = concrete.name, "registered singleton");
        self.singletons.register_concrete(key, concrete);
        Ok(())
    }

    pub(crate) fn register_singleton_factory(
        &mut self,
        key: Key,
        implementation: &'static str,
        factory: ErasedFactory,
    ) -> DiResult<()> {
        // Factories take no arguments; the node is recorded without edges.
        self.admit(key, Lifetime::Singleton, Some(Vec::new()))?;
        self.singletons.register_factory(key, implementation, factory);
        debug!(service = key.display_name(), implementation, "registered singleton factory");
        Ok(())
    }

    pub(crate) fn register_scoped(&mut self, key: Key, concrete: Concrete) -> DiResult<()> {
        self.admit(key, Lifetime::Scoped, Some(concrete.parameters.clone()))?;
        debug!(service = key.display_name(), implementation = concrete.name, "registered scoped");
        self.scoped.register(key, concrete);
        Ok(())
    }

    pub(crate) fn register_scope_context(&mut self, key: Key) -> DiResult<()> {
        self.admit(key, Lifetime::ScopeContext, None)?;
        self.contexts.bindings().declare(key);
        debug!(service = key.display_name(), "registered scope context");
        Ok(())
    }

    /// Resolves the abstract type `I` according to its lifetime.
    ///
    /// Fails with [`DiError::Unregistered`] if `I` has no binding, with
    /// [`DiError::NoActiveScope`] if `I` is scoped and the calling thread has
    /// no active scope, and with [`DiError::ResolutionFailed`] when a
    /// constructor parameter or the constructor itself fails.
    pub fn resolve<I>(&self) -> DiResult<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = Key::of::<I>();
        let value = self.resolve_key(&key)?;
        downcast_arc::<I>(&value).ok_or(DiError::TypeMismatch(key.display_name()))
    }

    /// Type-erased resolution by key.
    pub(crate) fn resolve_key(&self, key: &Key) -> DiResult<AnyArc> {
        let lifetime = self
            .lifetime_of_key(key)
            .ok_or(DiError::Unregistered(key.display_name()))?;
        trace!(service = key.display_name(), %lifetime, "resolving");
        self.resolver(lifetime).resolve(key, self)
    }

    fn resolvers(&self) -> [&dyn LifetimeResolver; 5] {
        [&self.instances, &self.transients, &self.singletons, &self.scoped, &self.contexts]
    }

    fn resolver(&self, lifetime: Lifetime) -> &dyn LifetimeResolver {
        match lifetime {
            Lifetime::Instance => &self.instances,
            Lifetime::Transient => &self.transients,
            Lifetime::Singleton => &self.singletons,
            Lifetime::Scoped => &self.scoped,
            Lifetime::ScopeContext => &self.contexts,
        }
    }

    /// Resolves every constructor parameter of `concrete` in order, then
    /// builds it as the value for `key`.
    pub(crate) fn construct(&self, key: &Key, concrete: &Concrete) -> DiResult<AnyArc> {
        if concrete.parameters.is_empty() {
            return concrete
                .build(Arguments::empty())
                .map_err(|err| DiError::resolution_failed(key.display_name(), err));
        }

        let mut arguments = Vec::with_capacity(concrete.parameters.len());
        for parameter in &concrete.parameters {
            let value = self
                .resolve_key(parameter)
                .map_err(|err| DiError::resolution_failed(key.display_name(), err))?;
            arguments.push((*parameter, value));
        }
        concrete
            .build(Arguments::new(arguments))
            .map_err(|err| DiError::resolution_failed(key.display_name(), err))
    }

    /// Fills every injectable field of `target`, in declaration order.
    ///
    /// Resolution errors for a field's type are returned unchanged; a value
    /// the target refuses is reported as [`DiError::InjectionFailed`]. Fields
    /// assigned before a failure keep their new values.
    ///
    /// ```rust
    /// use scopewire::{injectable, Container};
    /// use std::sync::Arc;
    ///
    /// #[derive(Default)]
    /// struct Handler {
    ///     greeting: Option<Arc<String>>,
    /// }
    ///
    /// injectable!(Handler { greeting: String });
    ///
    /// let mut container = Container::new();
    /// container.bind::<String>().unwrap().to_instance("hello".to_string()).unwrap();
    ///
    /// let mut handler = Handler::default();
    /// container.inject(&mut handler).unwrap();
    /// assert_eq!(handler.greeting.as_deref().map(String::as_str), Some("hello"));
    /// ```
    pub fn inject<T: InjectFields>(&self, target: &mut T) -> DiResult<()> {
        let target_name = std::any::type_name::<T>();
        for field in T::injectable_fields() {
            let value = self.resolve_key(&field.key)?;
            target
                .set_field(field.name, Resolved::new(field.key, value))
                .map_err(|source| DiError::InjectionFailed {
                    field: field.name,
                    target: target_name,
                    source,
                })?;
            trace!(injected_into = target_name, field = field.name, "injected");
        }
        Ok(())
    }

    /// Begins a scope on the calling thread.
    pub fn begin_scope(&self) {
        let depth = self.scopes.push(ScopeFrame::new());
        debug!(depth, "scope begun");
    }

    /// Begins a scope on the calling thread that supplies `context` as the
    /// value of `C`.
    ///
    /// If `C` is not bound yet it is registered as a scope context until the
    /// scope ends. `C` may already be a scope context, either declared with
    /// [`Binder::as_scope_context`] or introduced by an enclosing scope.
    /// Only the innermost scope's context is visible: while a nested scope
    /// is active, `C` resolves to [`DiError::Unregistered`] unless that scope
    /// supplies one too. Any other binding for `C` fails with
    /// [`DiError::AlreadyRegistered`] and no scope is begun.
    ///
    /// ```rust
    /// use scopewire::{Container, DiError};
    /// use std::sync::Arc;
    ///
    /// struct Request {
    ///     path: String,
    /// }
    ///
    /// let container = Container::new();
    /// let request = Arc::new(Request { path: "/users".into() });
    ///
    /// container.begin_scope_with_context(request.clone()).unwrap();
    /// let resolved = container.resolve::<Request>().unwrap();
    /// assert!(Arc::ptr_eq(&resolved, &request));
    /// assert_eq!(resolved.path, "/users");
    ///
    /// container.end_scope().unwrap();
    /// assert!(matches!(container.resolve::<Request>(), Err(DiError::Unregistered(_))));
    /// ```
    pub fn begin_scope_with_context<C>(&self, context: Arc<C>) -> DiResult<()>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let key = Key::of::<C>();
        match self.registry.lifetime(&key) {
            None | Some(Lifetime::ScopeContext) => {}
            Some(lifetime) => {
                return Err(DiError::AlreadyRegistered {
                    service: key.display_name(),
                    lifetime,
                })
            }
        }
        let depth = self.scopes.push(ScopeFrame::with_context(key, erase(context)));
        self.contexts.bindings().attach(key);
        debug!(depth, context = key.display_name(), "scope begun");
        Ok(())
    }

    /// Ends the calling thread's innermost scope.
    ///
    /// Scoped instances cached in the scope are released. A context binding
    /// the scope introduced is unregistered once no other open scope carries
    /// it. Fails with [`DiError::NoActiveScope`] if no scope is active.
    pub fn end_scope(&self) -> DiResult<()> {
        let frame = self.scopes.pop()?;
        if let Some(key) = frame.context_key() {
            if self.contexts.bindings().detach(&key) {
                debug!(context = key.display_name(), "scope context unregistered");
            }
        }
        debug!(depth = self.scopes.depth(), released = frame.cached_len(), "scope ended");
        // Cached instances are dropped here, with no lock held.
        drop(frame);
        Ok(())
    }

    /// Begins a scope that ends when the returned guard is dropped.
    pub fn scope(&self) -> ScopeGuard<'_> {
        self.begin_scope();
        ScopeGuard::new(self)
    }

    /// Guard form of [`begin_scope_with_context`](Self::begin_scope_with_context).
    pub fn scope_with_context<C>(&self, context: Arc<C>) -> DiResult<ScopeGuard<'_>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.begin_scope_with_context(context)?;
        Ok(ScopeGuard::new(self))
    }

    /// Number of scopes active on the calling thread.
    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    pub(crate) fn scopes(&self) -> &ScopeStacks {
        &self.scopes
    }

    /// Name of the concrete type bound to `I`.
    ///
    /// Scope contexts have no fixed implementation and report
    /// [`DiError::Unregistered`], as do unbound types.
    ///
    /// ```rust
    /// use scopewire::Container;
    ///
    /// let mut container = Container::new();
    /// container.bind::<u32>().unwrap().to_instance(1u32).unwrap();
    /// assert_eq!(container.implementation_of::<u32>().unwrap(), "u32");
    /// assert!(container.implementation_of::<u64>().is_err());
    /// ```
    pub fn implementation_of<I>(&self) -> DiResult<&'static str>
    where
        I: ?Sized + 'static,
    {
        let key = Key::of::<I>();
        let resolvers: [&dyn LifetimeResolver; 4] =
            [&self.singletons, &self.transients, &self.scoped, &self.instances];
        resolvers
            .iter()
            .find(|resolver| resolver.is_registered(&key))
            .and_then(|resolver| resolver.implementation_of(&key))
            .ok_or(DiError::Unregistered(key.display_name()))
    }

    /// Whether `I` currently has a binding.
    pub fn is_registered<I: ?Sized + 'static>(&self) -> bool {
        self.lifetime_of::<I>().is_some()
    }

    /// Lifetime `I` is bound under, if any.
    pub fn lifetime_of<I: ?Sized + 'static>(&self) -> Option<Lifetime> {
        self.lifetime_of_key(&Key::of::<I>())
    }

    /// Every bound abstract type, sorted by name.
    pub fn registered_types(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self
            .resolvers()
            .into_iter()
            .flat_map(|resolver| resolver.registered_keys())
            .collect();
        keys.sort_by_key(Key::display_name);
        keys
    }

    /// One descriptor per binding, sorted by type name.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut descriptors: Vec<ServiceDescriptor> = self
            .resolvers()
            .into_iter()
            .flat_map(|resolver| {
                let lifetime = resolver.lifetime();
                resolver.registered_keys().into_iter().map(move |key| {
                    ServiceDescriptor::new(
                        key,
                        lifetime,
                        resolver.implementation_of(&key),
                        self.graph.dependencies_of(&key).to_vec(),
                    )
                })
            })
            .collect();
        descriptors.sort_by_key(|descriptor| descriptor.key.display_name());
        descriptors
    }

    /// Snapshot of the static dependency graph.
    pub fn dependency_graph(&self) -> GraphSnapshot {
        GraphSnapshot::from_descriptors(&self.descriptors())
    }

    /// Human-readable listing of every binding and the calling thread's
    /// scope depth.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        use std::fmt::Write;

        let descriptors = self.descriptors();
        let mut out = String::new();
        let _ = writeln!(out, "Container ({} bindings, scope depth {})", descriptors.len(), self.scope_depth());
        for descriptor in &descriptors {
            let _ = writeln!(out, "  {descriptor}");
        }
        out
    }
}
