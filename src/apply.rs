//! Top-level entry points: tokenize, parse, evaluate, materialize.

use thiserror::Error;

use crate::{
    evaluator::{EvalError, Evaluator, materialize},
    lexer::Lexer,
    parser::{DEFAULT_MAX_DEPTH, ParseError, Parser},
    value::Value,
};

/// Any failure of [`apply`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Knobs for [`apply_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Deepest allowed nesting of `{ ... }` mappings in an expression
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Evaluates `expression` against `input`.
///
/// The expression is parsed afresh on every call. The result never contains
/// a stream: any lazily produced sequence is drained into an array first.
///
/// # Examples
///
/// ```
/// use sieve_lang::{apply, Value};
/// use std::collections::HashMap;
///
/// let mut doc = HashMap::new();
/// doc.insert("foo".to_string(), Value::from("b"));
/// doc.insert("bar".to_string(), Value::from("a"));
///
/// let result = apply(".foo, .bar", Value::Object(doc)).unwrap();
/// assert_eq!(result, Value::Array(vec![Value::from("b"), Value::from("a")]));
/// ```
pub fn apply(expression: &str, input: Value) -> Result<Value, Error> {
    apply_with(expression, input, &Options::default())
}

/// [`apply`] with explicit [`Options`].
#[tracing::instrument(level = "debug", skip(input, options))]
pub fn apply_with(expression: &str, input: Value, options: &Options) -> Result<Value, Error> {
    let mut parser = Parser::with_max_depth(Lexer::new(expression), options.max_depth);
    let filter = parser.parse()?;
    tracing::debug!(filter = %filter, "parsed expression");

    let output = Evaluator::new().eval(&filter, input)?;
    Ok(materialize(output)?)
}
