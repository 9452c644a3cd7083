//! Constructor introspection: how a concrete type declares its dependencies
//! and receives them.

use std::sync::Arc;

use thiserror::Error;

use crate::key::Key;
use crate::registration::{downcast_arc, AnyArc};

/// A concrete type the container can build.
///
/// `parameters` lists the abstract types the constructor needs, in order;
/// `construct` receives them resolved, in the same order. Each type has
/// exactly one constructor: the one implemented here.
///
/// Most implementations are written with the [`constructor!`](crate::constructor)
/// macro.
///
/// # Examples
///
/// ```rust
/// use scopewire::{Arguments, Construct, ConstructError, Key};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str);
/// }
///
/// struct UserService {
///     logger: Arc<dyn Logger>,
/// }
///
/// impl Construct for UserService {
///     fn parameters() -> Vec<Key> {
///         vec![Key::of::<dyn Logger>()]
///     }
///
///     fn construct(mut args: Arguments) -> Result<Self, ConstructError> {
///         Ok(UserService { logger: args.take::<dyn Logger>()? })
///     }
/// }
///
/// assert_eq!(UserService::parameters(), vec![Key::of::<dyn Logger>()]);
/// ```
pub trait Construct: Sized + Send + Sync + 'static {
    /// Abstract types required by the constructor, in argument order.
    fn parameters() -> Vec<Key>;

    /// Builds the value from its resolved arguments.
    fn construct(args: Arguments) -> Result<Self, ConstructError>;
}

/// Conversion from a concrete service to the abstract type it is bound
/// under.
///
/// Every type provides itself. Trait objects are provided with the
/// [`provides!`](crate::provides) macro:
///
/// ```rust
/// use scopewire::provides;
///
/// trait Logger: Send + Sync {}
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {}
///
/// provides!(ConsoleLogger => dyn Logger);
/// ```
pub trait Provides<I: ?Sized + Send + Sync + 'static>: Send + Sync + 'static {
    /// Upcasts the shared value to the abstract type.
    fn provide(self: Arc<Self>) -> Arc<I>;
}

impl<T: Send + Sync + 'static> Provides<T> for T {
    fn provide(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Failure reported by a constructor.
#[derive(Debug, Error)]
pub enum ConstructError {
    /// The constructor asked for more arguments than it declared
    #[error("Missing argument {position}: expected {expected}")]
    MissingArgument {
        position: usize,
        expected: &'static str,
    },
    /// The constructor took arguments in a different order than it declared
    #[error("Argument {position} is {found}, expected {expected}")]
    ArgumentMismatch {
        position: usize,
        expected: &'static str,
        found: &'static str,
    },
    /// The constructor itself failed
    #[error("Constructor failed: {0}")]
    Failed(String),
}

impl ConstructError {
    /// Constructor failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        ConstructError::Failed(message.into())
    }
}

/// Resolved constructor arguments, consumed in declaration order.
pub struct Arguments {
    values: std::vec::IntoIter<(Key, AnyArc)>,
    position: usize,
}

impl Arguments {
    pub(crate) fn new(values: Vec<(Key, AnyArc)>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Arguments for a constructor without parameters.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Takes the next argument as `Arc<I>`.
    ///
    /// Fails if the constructor declared fewer parameters, or declared a
    /// different type at this position.
    pub fn take<I: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<I>, ConstructError> {
        let expected = Key::of::<I>();
        let position = self.position;
        self.position += 1;

        let (key, value) = self.values.next().ok_or(ConstructError::MissingArgument {
            position,
            expected: expected.display_name(),
        })?;

        let mismatch = ConstructError::ArgumentMismatch {
            position,
            expected: expected.display_name(),
            found: key.display_name(),
        };
        if key != expected {
            return Err(mismatch);
        }
        downcast_arc::<I>(&value).ok_or(mismatch)
    }

    /// Number of arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// Implements [`Construct`] for a type from a constructor function and its
/// parameter types.
///
/// ```rust
/// use scopewire::{constructor, Construct, Key};
/// use std::sync::Arc;
///
/// struct Config;
/// struct Database {
///     config: Arc<Config>,
/// }
///
/// impl Database {
///     fn new(config: Arc<Config>) -> Self {
///         Database { config }
///     }
/// }
///
/// constructor!(Config => Config::default_config());
/// constructor!(Database => Database::new(Config));
///
/// impl Config {
///     fn default_config() -> Self {
///         Config
///     }
/// }
///
/// assert_eq!(Database::parameters(), vec![Key::of::<Config>()]);
/// assert!(Config::parameters().is_empty());
/// ```
#[macro_export]
macro_rules! constructor {
    ($concrete:ty => $($ctor:ident)::+ ( $($param:ty),* $(,)? )) => {
        impl $crate::Construct for $concrete {
            fn parameters() -> ::std::vec::Vec<$crate::Key> {
                ::std::vec![$($crate::Key::of::<$param>()),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn construct(
                mut args: $crate::Arguments,
            ) -> ::std::result::Result<Self, $crate::ConstructError> {
                ::std::result::Result::Ok($($ctor)::+($(args.take::<$param>()?),*))
            }
        }
    };
}

/// Implements [`Provides`] for a concrete type and one or more trait objects.
#[macro_export]
macro_rules! provides {
    ($concrete:ty => $($abstract:ty),+ $(,)?) => {
        $(
            impl $crate::Provides<$abstract> for $concrete {
                fn provide(
                    self: ::std::sync::Arc<Self>,
                ) -> ::std::sync::Arc<$abstract> {
                    self
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::erase;

    #[test]
    fn take_in_declared_order() {
        let mut args = Arguments::new(vec![
            (Key::of::<u32>(), erase(Arc::new(7u32))),
            (Key::of::<String>(), erase(Arc::new("seven".to_string()))),
        ]);

        assert_eq!(args.remaining(), 2);
        assert_eq!(*args.take::<u32>().unwrap(), 7);
        assert_eq!(args.take::<String>().unwrap().as_str(), "seven");
        assert_eq!(args.remaining(), 0);
    }

    #[test]
    fn take_past_the_end() {
        let mut args = Arguments::empty();
        match args.take::<u32>() {
            Err(ConstructError::MissingArgument { position, expected }) => {
                assert_eq!(position, 0);
                assert_eq!(expected, "u32");
            }
            _ => panic!("Expected MissingArgument"),
        }
    }

    #[test]
    fn take_out_of_order() {
        let mut args = Arguments::new(vec![(Key::of::<u32>(), erase(Arc::new(7u32)))]);
        match args.take::<u64>() {
            Err(ConstructError::ArgumentMismatch { position, expected, found }) => {
                assert_eq!(position, 0);
                assert_eq!(expected, "u64");
                assert_eq!(found, "u32");
            }
            _ => panic!("Expected ArgumentMismatch"),
        }
    }
}
