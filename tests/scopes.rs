use scopewire::{constructor, Container, DiError, Lifetime};
use std::sync::Arc;

struct RequestState {
    id: u64,
}

impl RequestState {
    fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT: AtomicU64 = AtomicU64::new(0);
        RequestState {
            id: NEXT.fetch_add(1, Ordering::SeqCst),
        }
    }
}

constructor!(RequestState => RequestState::new());

struct Request {
    path: String,
}

struct Handler {
    request: Arc<Request>,
    state: Arc<RequestState>,
}

impl Handler {
    fn new(request: Arc<Request>, state: Arc<RequestState>) -> Self {
        Handler { request, state }
    }
}

constructor!(Handler => Handler::new(Request, RequestState));

fn scoped_container() -> Container {
    let mut container = Container::new();
    container.bind::<RequestState>().unwrap().to_scoped::<RequestState>().unwrap();
    container
}

#[test]
fn test_scoped_same_within_scope() {
    let container = scoped_container();

    container.begin_scope();
    let a = container.resolve::<RequestState>().unwrap();
    let b = container.resolve::<RequestState>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    container.end_scope().unwrap();
}

#[test]
fn test_scoped_differs_across_scopes() {
    let container = scoped_container();

    container.begin_scope();
    let a = container.resolve::<RequestState>().unwrap();
    container.end_scope().unwrap();

    container.begin_scope();
    let b = container.resolve::<RequestState>().unwrap();
    container.end_scope().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(a.id, b.id);
}

#[test]
fn test_nested_scope_has_own_cache() {
    let container = scoped_container();

    container.begin_scope();
    let outer = container.resolve::<RequestState>().unwrap();

    container.begin_scope();
    let inner = container.resolve::<RequestState>().unwrap();
    assert!(!Arc::ptr_eq(&outer, &inner));
    container.end_scope().unwrap();

    let outer_again = container.resolve::<RequestState>().unwrap();
    assert!(Arc::ptr_eq(&outer, &outer_again));
    container.end_scope().unwrap();
}

#[test]
fn test_scoped_without_scope() {
    let container = scoped_container();
    assert!(matches!(container.resolve::<RequestState>(), Err(DiError::NoActiveScope)));
}

#[test]
fn test_end_scope_without_scope() {
    let container = Container::new();
    assert!(matches!(container.end_scope(), Err(DiError::NoActiveScope)));
}

#[test]
fn test_cached_instance_released_with_scope() {
    let container = scoped_container();

    container.begin_scope();
    let state = container.resolve::<RequestState>().unwrap();
    assert_eq!(Arc::strong_count(&state), 2);
    container.end_scope().unwrap();
    assert_eq!(Arc::strong_count(&state), 1);
}

#[test]
fn test_context_resolves_to_supplied_object() {
    let container = Container::new();
    let request = Arc::new(Request { path: "/users".into() });

    container.begin_scope_with_context(request.clone()).unwrap();
    assert_eq!(container.lifetime_of::<Request>(), Some(Lifetime::ScopeContext));
    let resolved = container.resolve::<Request>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &request));

    container.end_scope().unwrap();
    assert!(matches!(container.resolve::<Request>(), Err(DiError::Unregistered(_))));
    assert!(!container.is_registered::<Request>());
}

#[test]
fn test_context_feeds_constructors() {
    let mut container = scoped_container();
    container.bind::<Handler>().unwrap().to_transient::<Handler>().unwrap();

    container
        .begin_scope_with_context(Arc::new(Request { path: "/orders".into() }))
        .unwrap();
    let first = container.resolve::<Handler>().unwrap();
    let second = container.resolve::<Handler>().unwrap();
    assert_eq!(first.request.path, "/orders");
    assert!(Arc::ptr_eq(&first.state, &second.state));
    container.end_scope().unwrap();

    assert!(matches!(container.resolve::<Handler>(), Err(DiError::ResolutionFailed { .. })));
}

#[test]
fn test_nested_contexts_shadow_and_restore() {
    let container = Container::new();

    container
        .begin_scope_with_context(Arc::new(Request { path: "/outer".into() }))
        .unwrap();
    container
        .begin_scope_with_context(Arc::new(Request { path: "/inner".into() }))
        .unwrap();
    assert_eq!(container.resolve::<Request>().unwrap().path, "/inner");

    container.end_scope().unwrap();
    assert_eq!(container.resolve::<Request>().unwrap().path, "/outer");

    container.end_scope().unwrap();
    assert!(!container.is_registered::<Request>());
}

#[test]
fn test_declared_context_survives_scope_end() {
    let mut container = Container::new();
    container.bind::<Request>().unwrap().as_scope_context().unwrap();

    // Declared, but no scope supplies it yet.
    assert!(matches!(container.resolve::<Request>(), Err(DiError::Unregistered(_))));

    container
        .begin_scope_with_context(Arc::new(Request { path: "/a".into() }))
        .unwrap();
    assert_eq!(container.resolve::<Request>().unwrap().path, "/a");
    container.end_scope().unwrap();

    assert_eq!(container.lifetime_of::<Request>(), Some(Lifetime::ScopeContext));
}

#[test]
fn test_context_conflicts_with_other_binding() {
    let mut container = Container::new();
    container.bind::<String>().unwrap().to_instance("fixed".to_string()).unwrap();

    let result = container.begin_scope_with_context(Arc::new("ctx".to_string()));
    assert!(matches!(
        result,
        Err(DiError::AlreadyRegistered { lifetime: Lifetime::Instance, .. })
    ));
    assert_eq!(container.scope_depth(), 0);
    assert_eq!(*container.resolve::<String>().unwrap(), "fixed");
}

#[test]
fn test_plain_inner_scope_carries_no_context() {
    let container = Container::new();
    container
        .begin_scope_with_context(Arc::new(Request { path: "/root".into() }))
        .unwrap();
    container.begin_scope();

    // The binding stays, but the active scope supplies no object.
    assert_eq!(container.lifetime_of::<Request>(), Some(Lifetime::ScopeContext));
    assert!(matches!(container.resolve::<Request>(), Err(DiError::Unregistered(_))));

    container.end_scope().unwrap();
    assert_eq!(container.resolve::<Request>().unwrap().path, "/root");
    container.end_scope().unwrap();
}

#[test]
fn test_scopes_left_open_by_exiting_thread_are_released() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DROPPED: AtomicUsize = AtomicUsize::new(0);

    struct Session;

    impl Session {
        fn new() -> Self {
            Session
        }
    }

    impl Drop for Session {
        fn drop(&mut self) {
            DROPPED.fetch_add(1, Ordering::SeqCst);
        }
    }

    constructor!(Session => Session::new());

    let mut container = Container::new();
    container.bind::<Session>().unwrap().to_scoped::<Session>().unwrap();
    let container = Arc::new(container);

    let worker = Arc::clone(&container);
    std::thread::spawn(move || {
        worker
            .begin_scope_with_context(Arc::new(Request { path: "/abandoned".into() }))
            .unwrap();
        worker.begin_scope();
        worker.resolve::<Session>().unwrap();
        assert!(worker.is_registered::<Request>());
    })
    .join()
    .unwrap();

    assert_eq!(DROPPED.load(Ordering::SeqCst), 1);
    assert!(!container.is_registered::<Request>());
    assert_eq!(container.registered_types().len(), 1);

    let mut container = Arc::try_unwrap(container).ok().unwrap();
    container.bind::<Request>().unwrap().as_scope_context().unwrap();
    assert_eq!(container.lifetime_of::<Request>(), Some(Lifetime::ScopeContext));
}

#[test]
fn test_dropping_container_releases_open_scope() {
    let container = scoped_container();
    container.begin_scope();
    let state = container.resolve::<RequestState>().unwrap();
    assert_eq!(Arc::strong_count(&state), 2);

    drop(container);
    assert_eq!(Arc::strong_count(&state), 1);
}

#[test]
fn test_scope_guard() {
    let container = scoped_container();
    {
        let _scope = container.scope();
        assert_eq!(container.scope_depth(), 1);
        assert!(container.resolve::<RequestState>().is_ok());
    }
    assert_eq!(container.scope_depth(), 0);

    let guard = container
        .scope_with_context(Arc::new(Request { path: "/guarded".into() }))
        .unwrap();
    assert_eq!(container.resolve::<Request>().unwrap().path, "/guarded");
    guard.end().unwrap();
    assert!(!container.is_registered::<Request>());
}

#[test]
fn test_scopes_are_thread_local() {
    let container = Arc::new(scoped_container());
    container.begin_scope();

    let other = Arc::clone(&container);
    let outcome = std::thread::spawn(move || {
        (other.scope_depth(), other.resolve::<RequestState>().is_err())
    })
    .join()
    .unwrap();

    assert_eq!(outcome, (0, true));
    assert_eq!(container.scope_depth(), 1);
    container.end_scope().unwrap();
}
