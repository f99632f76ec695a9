//! Execute sieve expressions against JSON input

use super::{CliError, json_to_value, value_to_json};
use crate::{Lexer, Options, Parser, apply_with, parser::DEFAULT_MAX_DEPTH};

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// The sieve expression to execute
    pub expression: String,
    /// JSON input string
    pub input: Option<String>,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
    /// Deepest allowed nesting of `{ ... }` mappings
    pub max_depth: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            expression: String::new(),
            input: None,
            syntax_only: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression executed successfully with JSON output
    Success(serde_json::Value),
}

/// Execute a sieve check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    if options.syntax_only {
        let mut parser = Parser::with_max_depth(Lexer::new(&options.expression), options.max_depth);
        parser.parse()?;
        return Ok(CheckResult::SyntaxValid);
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let json_value: serde_json::Value = serde_json::from_str(json_str)?;

    let sieve_options = Options {
        max_depth: options.max_depth,
    };
    let result = apply_with(&options.expression, json_to_value(json_value), &sieve_options)?;

    Ok(CheckResult::Success(value_to_json(result)?))
}
