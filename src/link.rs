//! Deferred references.
//!
//! A [`Link`] stands in for a value the host has not loaded yet. The
//! evaluator resolves it the first time a filter needs to look inside it;
//! how resolution happens (a cache, a database, a network fetch) is up to the
//! host's [`Resolve`] implementation.

use std::{fmt, rc::Rc};

use thiserror::Error;

use crate::value::Value;

/// Failure reported by a link resolver. Passed through to the caller as is.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct LinkError {
    message: String,
}

impl LinkError {
    pub fn new(message: impl Into<String>) -> Self {
        LinkError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Resolution capability supplied by the host for its deferred values.
pub trait Resolve {
    fn resolve(&self) -> Result<Value, LinkError>;
}

impl<F> Resolve for F
where
    F: Fn() -> Result<Value, LinkError>,
{
    fn resolve(&self) -> Result<Value, LinkError> {
        self()
    }
}

/// An opaque reference that yields a [`Value`] when resolved.
///
/// Clones share the same resolver.
#[derive(Clone)]
pub struct Link {
    resolver: Rc<dyn Resolve>,
}

impl Link {
    pub fn new(resolver: impl Resolve + 'static) -> Self {
        Link {
            resolver: Rc::new(resolver),
        }
    }

    /// A link that always resolves to a clone of `value`.
    pub fn to_value(value: Value) -> Self {
        Link::new(move || -> Result<Value, LinkError> { Ok(value.clone()) })
    }

    pub fn resolve(&self) -> Result<Value, LinkError> {
        self.resolver.resolve()
    }

    pub fn ptr_eq(&self, other: &Link) -> bool {
        Rc::ptr_eq(&self.resolver, &other.resolver)
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Link(..)")
    }
}
