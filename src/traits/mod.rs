//! Core traits for the dependency injection container.

mod construct;
mod inject;
mod resolver;

pub use construct::{Arguments, Construct, ConstructError, Provides};
pub use inject::{FieldError, InjectFields, InjectableField, Resolved};
pub(crate) use resolver::LifetimeResolver;
