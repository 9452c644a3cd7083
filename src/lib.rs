//! # scopewire
//!
//! A dependency injection container with constructor injection, field
//! injection, lifetime-aware caching and registration-time cycle detection.
//!
//! ## Features
//!
//! - **Five lifetimes**: Instance, Transient, Singleton, Scoped and Scope context
//! - **Trait support**: bind `dyn Trait` to a concrete type with [`provides!`]
//! - **Constructor injection**: concrete types declare their parameters through [`Construct`]
//! - **Field injection**: fill `Option<Arc<T>>` fields of existing values with [`injectable!`]
//! - **Cycle detection**: a registration closing a dependency cycle is rejected with its path
//! - **Per-thread scopes**: scoped caches and scope contexts never leak across threads
//! - **Thread-safe**: once configured, a container can be shared and resolved concurrently
//!
//! ## Quick Start
//!
//! ```rust
//! use scopewire::{constructor, provides, Container};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str) -> String;
//! }
//!
//! trait Service: Send + Sync {
//!     fn logger(&self) -> &Arc<dyn Logger>;
//! }
//!
//! struct ConsoleLogger;
//!
//! impl ConsoleLogger {
//!     fn new() -> Self {
//!         ConsoleLogger
//!     }
//! }
//!
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) -> String {
//!         format!("[LOG] {message}")
//!     }
//! }
//!
//! struct ServiceImpl {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! impl ServiceImpl {
//!     fn new(logger: Arc<dyn Logger>) -> Self {
//!         ServiceImpl { logger }
//!     }
//! }
//!
//! impl Service for ServiceImpl {
//!     fn logger(&self) -> &Arc<dyn Logger> {
//!         &self.logger
//!     }
//! }
//!
//! constructor!(ConsoleLogger => ConsoleLogger::new());
//! constructor!(ServiceImpl => ServiceImpl::new(dyn Logger));
//! provides!(ConsoleLogger => dyn Logger);
//! provides!(ServiceImpl => dyn Service);
//!
//! let mut container = Container::new();
//! container.bind::<dyn Logger>().unwrap().to_singleton::<ConsoleLogger>().unwrap();
//! container.bind::<dyn Service>().unwrap().to_transient::<ServiceImpl>().unwrap();
//!
//! let logger = container.resolve::<dyn Logger>().unwrap();
//! let service = container.resolve::<dyn Service>().unwrap();
//! assert!(Arc::ptr_eq(service.logger(), &logger));
//! assert_eq!(logger.log("ready"), "[LOG] ready");
//!
//! // Transient: a new service each time, sharing the singleton logger
//! let again = container.resolve::<dyn Service>().unwrap();
//! assert!(!Arc::ptr_eq(&service, &again));
//! assert!(Arc::ptr_eq(service.logger(), again.logger()));
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use scopewire::{constructor, Container};
//! use std::sync::Arc;
//!
//! struct RequestId(u64);
//!
//! impl RequestId {
//!     fn new() -> Self {
//!         use std::sync::atomic::{AtomicU64, Ordering};
//!         static NEXT: AtomicU64 = AtomicU64::new(0);
//!         RequestId(NEXT.fetch_add(1, Ordering::Relaxed))
//!     }
//! }
//!
//! constructor!(RequestId => RequestId::new());
//!
//! let mut container = Container::new();
//! container.bind::<RequestId>().unwrap().to_scoped::<RequestId>().unwrap();
//!
//! let first = {
//!     let _scope = container.scope();
//!     let a = container.resolve::<RequestId>().unwrap();
//!     let b = container.resolve::<RequestId>().unwrap();
//!     assert!(Arc::ptr_eq(&a, &b));
//!     a
//! };
//!
//! container.begin_scope();
//! let second = container.resolve::<RequestId>().unwrap();
//! container.end_scope().unwrap();
//! assert_ne!(first.0, second.0);
//!
//! // Outside any scope
//! assert!(container.resolve::<RequestId>().is_err());
//! ```
//!
//! ## Feature flags
//!
//! - `diagnostics`: `Container::to_debug_string()`
//! - `graph-export`: `serde` serialization of [`GraphSnapshot`] and `GraphSnapshot::to_json()`

// Module declarations
pub mod binder;
pub mod container;
pub mod descriptors;
pub mod error;
pub mod graph_export;
pub mod key;
pub mod lifetime;
pub mod traits;

// Internal modules
mod internal;
mod registration;
mod resolvers;

// Re-exports
pub use binder::Binder;
pub use container::{Container, ScopeGuard};
pub use descriptors::ServiceDescriptor;
pub use error::{BoxError, DiError, DiResult};
pub use graph_export::{GraphEdge, GraphNode, GraphSnapshot};
pub use key::{key_of_type, Key};
pub use lifetime::Lifetime;
pub use traits::{
    Arguments, Construct, ConstructError, FieldError, InjectFields, InjectableField, Provides,
    Resolved,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl English {
        fn new() -> Self {
            English
        }
    }

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    crate::constructor!(English => English::new());
    crate::provides!(English => dyn Greeter);

    #[test]
    fn container_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Container>();
    }

    #[test]
    fn trait_object_binding() {
        let mut container = Container::new();
        container.bind::<dyn Greeter>().unwrap().to_transient::<English>().unwrap();

        assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "hello");
        assert!(container.implementation_of::<dyn Greeter>().unwrap().ends_with("English"));
        assert!(container.registered_types().contains(&Key::of::<dyn Greeter>()));
    }

    #[test]
    fn shared_instance_keeps_identity() {
        let shared: Arc<dyn Greeter> = Arc::new(English);
        let mut container = Container::new();
        container.bind::<dyn Greeter>().unwrap().to_shared_instance(shared.clone()).unwrap();

        assert!(Arc::ptr_eq(&container.resolve::<dyn Greeter>().unwrap(), &shared));
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn debug_string_lists_bindings() {
        let mut container = Container::new();
        container.bind::<dyn Greeter>().unwrap().to_singleton::<English>().unwrap();

        let out = container.to_debug_string();
        assert!(out.starts_with("Container (1 bindings, scope depth 0)"));
        assert!(out.contains("(singleton)"));
    }
}
