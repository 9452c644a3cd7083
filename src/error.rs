//! Error types for the dependency injection container.

use thiserror::Error;

use crate::lifetime::Lifetime;
use crate::traits::FieldError;

/// Boxed error used as the cause of a failed resolution.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Every error is terminal for the call that raised it. Registration errors
/// leave the container exactly as it was before the call.
///
/// # Examples
///
/// ```rust
/// use scopewire::{Container, DiError};
///
/// let container = Container::new();
/// match container.resolve::<String>() {
///     Err(DiError::Unregistered(name)) => assert_eq!(name, "alloc::string::String"),
///     _ => unreachable!(),
/// }
///
/// match container.end_scope() {
///     Err(DiError::NoActiveScope) => {}
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use scopewire::DiError;
///
/// let cycle = DiError::CyclicDependency(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(cycle.to_string(), "Cyclic dependency: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// The abstract type already has a binding
    #[error("Type {service} has already been registered under lifetime {lifetime}")]
    AlreadyRegistered {
        service: &'static str,
        lifetime: Lifetime,
    },
    /// No binding exists for the requested type
    #[error("Type {0} was not registered")]
    Unregistered(&'static str),
    /// Registration would close a cycle (includes path)
    #[error("Cyclic dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<&'static str>),
    /// Building the requested type or one of its parameters failed
    #[error("An error occurred while resolving type {service}")]
    ResolutionFailed {
        service: &'static str,
        #[source]
        source: BoxError,
    },
    /// A field of an injection target could not be assigned
    #[error("Could not inject field {field} of type {target}")]
    InjectionFailed {
        field: &'static str,
        target: &'static str,
        #[source]
        source: FieldError,
    },
    /// Scoped resolution or `end_scope` without an active scope
    #[error("No active scope")]
    NoActiveScope,
    /// Stored value did not have the requested type
    ///
    /// Every value is stored under the key of the type it was bound as, so
    /// this only signals a broken internal invariant; no public operation is
    /// expected to produce it.
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
}

impl DiError {
    pub(crate) fn resolution_failed(service: &'static str, cause: impl Into<BoxError>) -> Self {
        DiError::ResolutionFailed {
            service,
            source: cause.into(),
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
