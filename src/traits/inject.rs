//! Field injection: targets that expose fields for the container to fill.

use std::sync::Arc;

use thiserror::Error;

use crate::key::Key;
use crate::registration::{downcast_arc, AnyArc};

/// A field the container should populate, with the abstract type it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectableField {
    /// Field name, as passed back to [`InjectFields::set_field`].
    pub name: &'static str,
    /// Abstract type resolved for the field.
    pub key: Key,
}

impl InjectableField {
    pub fn new(name: &'static str, key: Key) -> Self {
        Self { name, key }
    }
}

/// A target whose fields are filled by [`Container::inject`](crate::Container::inject).
///
/// Usually generated with the [`injectable!`](crate::injectable) macro rather
/// than written by hand.
pub trait InjectFields: 'static {
    /// Fields requesting injection, in assignment order.
    fn injectable_fields() -> Vec<InjectableField>;

    /// Assigns a resolved value to the named field.
    fn set_field(&mut self, field: &'static str, value: Resolved) -> Result<(), FieldError>;
}

/// A resolved value on its way into a field.
pub struct Resolved {
    key: Key,
    value: AnyArc,
}

impl Resolved {
    pub(crate) fn new(key: Key, value: AnyArc) -> Self {
        Self { key, value }
    }

    /// Abstract type the value was resolved for.
    pub fn key(&self) -> Key {
        self.key
    }

    /// Recovers the value as `Arc<I>`.
    pub fn downcast<I: ?Sized + Send + Sync + 'static>(self) -> Result<Arc<I>, FieldError> {
        downcast_arc::<I>(&self.value).ok_or(FieldError::TypeMismatch {
            expected: std::any::type_name::<I>(),
            found: self.key.display_name(),
        })
    }
}

/// Failure assigning a field.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("No injectable field named {0}")]
    UnknownField(&'static str),
    #[error("A value of type {found} cannot be assigned to a field of type {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Implements [`InjectFields`] for a struct whose injectable fields are
/// `Option<Arc<T>>`.
///
/// ```rust
/// use scopewire::{injectable, InjectFields, Key};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
///
/// #[derive(Default)]
/// struct Controller {
///     clock: Option<Arc<dyn Clock>>,
///     name: String,
/// }
///
/// injectable!(Controller { clock: dyn Clock });
///
/// let fields = Controller::injectable_fields();
/// assert_eq!(fields.len(), 1);
/// assert_eq!(fields[0].name, "clock");
/// assert_eq!(fields[0].key, Key::of::<dyn Clock>());
/// ```
#[macro_export]
macro_rules! injectable {
    ($target:ty { $($field:ident : $abstract:ty),* $(,)? }) => {
        impl $crate::InjectFields for $target {
            fn injectable_fields() -> ::std::vec::Vec<$crate::InjectableField> {
                ::std::vec![
                    $($crate::InjectableField::new(
                        ::std::stringify!($field),
                        $crate::Key::of::<$abstract>(),
                    )),*
                ]
            }

            #[allow(unused_variables)]
            fn set_field(
                &mut self,
                field: &'static str,
                value: $crate::Resolved,
            ) -> ::std::result::Result<(), $crate::FieldError> {
                $(
                    if field == ::std::stringify!($field) {
                        self.$field = ::std::option::Option::Some(value.downcast::<$abstract>()?);
                        return ::std::result::Result::Ok(());
                    }
                )*
                ::std::result::Result::Err($crate::FieldError::UnknownField(field))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::erase;

    #[test]
    fn downcast_matching_type() {
        let resolved = Resolved::new(Key::of::<u32>(), erase(Arc::new(5u32)));
        assert_eq!(resolved.key(), Key::of::<u32>());
        assert_eq!(*resolved.downcast::<u32>().unwrap(), 5);
    }

    #[test]
    fn downcast_wrong_type() {
        let resolved = Resolved::new(Key::of::<u32>(), erase(Arc::new(5u32)));
        match resolved.downcast::<String>() {
            Err(FieldError::TypeMismatch { expected, found }) => {
                assert_eq!(expected, "alloc::string::String");
                assert_eq!(found, "u32");
            }
            _ => panic!("Expected TypeMismatch"),
        }
    }
}
