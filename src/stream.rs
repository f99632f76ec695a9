//! Lazy, forward-only sequences.
//!
//! A [`Stream`] is a pull cursor: elements are produced one at a time when
//! the consumer asks for them, and a stream cannot be restarted. Streams are
//! handed in by the host or created by the evaluator when it maps a selector
//! over an incoming stream; the top-level driver drains whatever is left into
//! arrays before returning.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::{ast::IndexRange, evaluator::EvalError, value::Value};

type Cursor = Box<dyn Iterator<Item = Result<Value, EvalError>>>;

/// Single-pass sequence of values.
///
/// Clones share one cursor, so an element pulled through one clone is gone
/// for every other clone.
#[derive(Clone)]
pub struct Stream {
    cursor: Rc<RefCell<Cursor>>,
}

impl Stream {
    /// Wraps a host iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use sieve_lang::{Stream, Value};
    ///
    /// let stream = Stream::new((1..=3).map(Value::Integer));
    /// let values: Result<Vec<_>, _> = stream.collect();
    /// assert_eq!(values.unwrap().len(), 3);
    /// ```
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Stream::from_results(values.into_iter().map(Ok))
    }

    pub fn from_results<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Result<Value, EvalError>>,
        I::IntoIter: 'static,
    {
        Stream {
            cursor: Rc::new(RefCell::new(Box::new(items.into_iter()))),
        }
    }

    /// Lazily applies `f` to every element.
    pub fn map_values<F>(self, mut f: F) -> Stream
    where
        F: FnMut(Value) -> Result<Value, EvalError> + 'static,
    {
        Stream::from_results(self.map(move |item| item.and_then(&mut f)))
    }

    /// Lazily yields the elements whose position falls in `range`.
    ///
    /// With an explicit stop the upstream cursor is pulled exactly `stop`
    /// times at most.
    pub fn slice(self, range: IndexRange) -> Stream {
        if range.all {
            return self;
        }
        let upstream: Cursor = match range.stop {
            Some(stop) => Box::new(self.take(stop)),
            None => Box::new(self),
        };
        Stream::from_results(
            upstream
                .enumerate()
                .filter(move |(i, item)| item.is_err() || range.contains(*i))
                .map(|(_, item)| item),
        )
    }

    pub fn ptr_eq(&self, other: &Stream) -> bool {
        Rc::ptr_eq(&self.cursor, &other.cursor)
    }
}

impl Iterator for Stream {
    type Item = Result<Value, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.try_borrow_mut() {
            Ok(mut cursor) => cursor.next(),
            Err(_) => Some(Err(EvalError::StreamInUse)),
        }
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Stream(..)")
    }
}
