use std::collections::HashMap;

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

use crate::{
    ast::{BinOp, Filter, Selector},
    link::{Link, LinkError},
    stream::Stream,
    value::Value,
};

/// Errors that can occur while applying a filter to a value.
///
/// Missing keys and lookups on values that have no members are not errors;
/// they produce `null`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The filter is not defined for the kind of value it received
    #[error("Type error: cannot apply `{filter}` to {found}")]
    TypeError { filter: String, found: String },

    /// Positional lookup outside `[0, len)`
    #[error("Index error: index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The host resolver failed; its error is kept as is
    #[error("Link error: {0}")]
    LinkResolution(#[from] LinkError),

    /// A stream was pulled while it was already producing an element
    #[error("Stream error: stream is already being consumed")]
    StreamInUse,
}

fn resolve_link(link: &Link) -> Result<Value, EvalError> {
    tracing::trace!("resolving link");
    Ok(link.resolve()?)
}

/// Resolves `value` until it is no longer a link.
pub fn resolve(mut value: Value) -> Result<Value, EvalError> {
    while let Value::Link(link) = value {
        value = resolve_link(&link)?;
    }
    Ok(value)
}

fn count(n: usize) -> Value {
    Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Applies `op` to two numbers, exactly when both fit a decimal.
fn combine(op: BinOp, a: f64, b: f64) -> f64 {
    if let Some(x) = Decimal::from_f64(a)
        && let Some(y) = Decimal::from_f64(b)
        && x.to_f64() == Some(a)
        && y.to_f64() == Some(b)
    {
        let exact = match op {
            BinOp::Add => x.checked_add(y),
            BinOp::Multiply => x.checked_mul(y),
        };
        if let Some(r) = exact.and_then(|r| r.to_f64()) {
            return r;
        }
    }
    match op {
        BinOp::Add => a + b,
        BinOp::Multiply => a * b,
    }
}

/// Drains every stream in `value` into an array, recursively.
///
/// Used on the final result and on each member of a group or mapping; links
/// are left untouched.
pub fn materialize(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Stream(stream) => {
            tracing::trace!("draining stream");
            stream
                .map(|item| materialize(item?))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        Value::Array(items) => items
            .into_iter()
            .map(materialize)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| Ok((key, materialize(value)?)))
            .collect::<Result<HashMap<_, _>, EvalError>>()
            .map(Value::Object),
        Value::Record(record) => record.map_values(materialize).map(Value::Record),
        other => Ok(other),
    }
}

/// Walks a filter tree against an input value.
///
/// The evaluator holds no state; it is `Copy` so lazily mapped streams can
/// carry it along.
#[derive(Debug, Default, Clone, Copy)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    /// Applies `filter` to `input`.
    ///
    /// The result may still contain streams; pass it through [`materialize`]
    /// before handing it out.
    ///
    /// # Examples
    ///
    /// ```
    /// use sieve_lang::{Evaluator, Value, ast::{Filter, Selector}};
    /// use std::collections::HashMap;
    ///
    /// let mut doc = HashMap::new();
    /// doc.insert("a".to_string(), Value::from("b"));
    ///
    /// let filter = Filter::Selector(Selector::Key("a".to_string()));
    /// let result = Evaluator::new().eval(&filter, Value::Object(doc)).unwrap();
    /// assert_eq!(result, Value::from("b"));
    /// ```
    pub fn eval(&self, filter: &Filter, input: Value) -> Result<Value, EvalError> {
        tracing::trace!(node = filter.kind_name(), input = input.kind_name(), "eval");

        match (filter, input) {
            // Every node sees resolved input.
            (_, Value::Link(link)) => self.eval(filter, resolve_link(&link)?),

            (Filter::Selector(selector), input) => self.select(selector, input),
            (Filter::SelectorChain(selectors), input) => selectors
                .iter()
                .try_fold(input, |value, selector| self.select(selector, value)),
            (Filter::FilterChain(stages), input) => stages
                .iter()
                .try_fold(input, |value, stage| self.eval(stage, value)),

            (
                Filter::StringLiteral(_)
                | Filter::NumericLiteral(_)
                | Filter::Length
                | Filter::BinaryOp { .. }
                | Filter::ParallelGroup(_)
                | Filter::ObjectMapping(_),
                Value::Stream(stream),
            ) => Ok(self.broadcast(filter, stream)),

            (Filter::StringLiteral(s), _) => Ok(Value::String(s.clone())),
            (Filter::NumericLiteral(n), _) => Ok(Value::Float(*n)),

            (
                Filter::Length,
                Value::Null | Value::Boolean(_) | Value::Integer(_) | Value::Float(_),
            ) => Ok(Value::Null),
            (Filter::Length, Value::String(s)) => Ok(count(s.chars().count())),
            (Filter::Length, Value::Bytes(bytes)) => Ok(count(bytes.len())),
            (Filter::Length, Value::Array(items)) => Ok(count(items.len())),
            (Filter::Length, Value::Object(map)) => Ok(count(map.len())),
            (Filter::Length, Value::Record(record)) => Ok(count(record.len())),

            (Filter::BinaryOp { left, op, right }, input) => {
                let lhs = self.eval(left, input.clone())?;
                let rhs = self.eval(right, input)?;
                self.arithmetic(filter, *op, lhs, rhs)
            }

            // Members share any stream inside `input`, so each one is drained
            // before the next runs; elements go to members in listed order.
            (Filter::ParallelGroup(members), input) => members
                .iter()
                .map(|member| materialize(self.eval(member, input.clone())?))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),

            (Filter::ObjectMapping(entries), input) => entries
                .iter()
                .map(|(key, value)| {
                    Ok((key.clone(), materialize(self.eval(value, input.clone())?)?))
                })
                .collect::<Result<HashMap<_, _>, EvalError>>()
                .map(Value::Object),
        }
    }

    fn select(&self, selector: &Selector, input: Value) -> Result<Value, EvalError> {
        match (selector, input) {
            (_, Value::Link(link)) => self.select(selector, resolve_link(&link)?),

            (Selector::Identity, input) => Ok(input),

            (Selector::Key(name), Value::Object(mut map)) => {
                Ok(map.remove(name.as_str()).unwrap_or(Value::Null))
            }
            (Selector::Key(name), Value::Record(record)) => {
                Ok(record.get(name).cloned().unwrap_or(Value::Null))
            }
            (Selector::Key(_), Value::Array(items)) => items
                .into_iter()
                .map(|item| self.select(selector, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (Selector::Key(_), Value::Stream(stream)) => {
                let selector = selector.clone();
                let evaluator = *self;
                Ok(Value::Stream(
                    stream.map_values(move |item| evaluator.select(&selector, item)),
                ))
            }
            (Selector::Key(_), _) => Ok(Value::Null),

            (Selector::Index(index), Value::Array(mut items)) => {
                let len = items.len();
                if *index < len {
                    Ok(items.swap_remove(*index))
                } else {
                    Err(EvalError::IndexOutOfRange { index: *index, len })
                }
            }
            (Selector::Index(index), Value::String(s)) => s
                .chars()
                .nth(*index)
                .map(|c| Value::String(c.to_string()))
                .ok_or_else(|| EvalError::IndexOutOfRange {
                    index: *index,
                    len: s.chars().count(),
                }),
            (Selector::Index(index), Value::Bytes(bytes)) => bytes
                .get(*index)
                .map(|b| Value::Integer(i64::from(*b)))
                .ok_or(EvalError::IndexOutOfRange {
                    index: *index,
                    len: bytes.len(),
                }),
            (Selector::Index(_), Value::Stream(stream)) => stream
                .map(|item| self.select(selector, item?))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (Selector::Index(_), _) => Ok(Value::Null),

            (Selector::Range(range), Value::Array(mut items)) => {
                let (start, stop) = range.bounds(items.len());
                Ok(Value::Array(items.drain(start..stop).collect()))
            }
            (Selector::Range(range), Value::String(s)) => {
                let (start, stop) = range.bounds(s.chars().count());
                Ok(Value::String(s.chars().skip(start).take(stop - start).collect()))
            }
            (Selector::Range(range), Value::Bytes(bytes)) => {
                let (start, stop) = range.bounds(bytes.len());
                Ok(Value::Bytes(bytes[start..stop].to_vec()))
            }
            (Selector::Range(range), Value::Stream(stream)) => {
                Ok(Value::Stream(stream.slice(*range)))
            }
            (Selector::Range(_), _) => Ok(Value::Null),
        }
    }

    /// Lazily applies `filter` to every element of `stream`.
    fn broadcast(&self, filter: &Filter, stream: Stream) -> Value {
        let filter = filter.clone();
        let evaluator = *self;
        Value::Stream(stream.map_values(move |item| evaluator.eval(&filter, item)))
    }

    fn arithmetic(
        &self,
        filter: &Filter,
        op: BinOp,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, EvalError> {
        let lhs = resolve(lhs)?;
        let rhs = resolve(rhs)?;

        match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(combine(op, a, b))),
            _ => Err(EvalError::TypeError {
                filter: filter.to_string(),
                found: format!("{} and {}", lhs.kind_name(), rhs.kind_name()),
            }),
        }
    }
}
