use std::fmt;

use crate::ast::{BinOp, TokenKind};

/// One step of a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Identity (`.`), returns its input unchanged
    Identity,

    /// Member lookup by name
    ///
    /// # Examples
    /// ```text
    /// .name
    /// ."key with spaces"
    /// ```
    Key(String),

    /// Positional lookup, 0-based
    ///
    /// # Example
    /// ```text
    /// [1]
    /// ```
    Index(usize),

    /// Sub-sequence extraction
    ///
    /// # Examples
    /// ```text
    /// [0:2]
    /// [1:]
    /// [:]
    /// ```
    Range(IndexRange),
}

/// Bounds of a range selector.
///
/// `stop` is exclusive and `None` means "to the end". When `all` is set both
/// bounds are ignored; the parser sets it only for `[]` and `[:]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexRange {
    pub start: usize,
    pub stop: Option<usize>,
    pub all: bool,
}

impl IndexRange {
    pub fn all() -> Self {
        IndexRange {
            start: 0,
            stop: None,
            all: true,
        }
    }

    pub fn new(start: usize, stop: Option<usize>) -> Self {
        IndexRange {
            start,
            stop,
            all: false,
        }
    }

    /// Clamped `[start, stop)` bounds for a sequence of `len` elements.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        if self.all {
            return (0, len);
        }
        let stop = self.stop.map_or(len, |stop| stop.min(len));
        let start = self.start.min(stop);
        (start, stop)
    }

    /// Whether position `i` falls inside the range, without knowing the length.
    pub fn contains(&self, i: usize) -> bool {
        self.all || (i >= self.start && self.stop.is_none_or(|stop| i < stop))
    }
}

/// Node of the filter-expression tree.
///
/// The tree is built once per `apply` call by the parser and is never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// String literal, produced by quoted text or any bareword but `length`
    ///
    /// # Examples
    /// ```text
    /// "swoosh"
    /// swoosh
    /// ```
    StringLiteral(String),

    /// Numeric literal
    ///
    /// # Examples
    /// ```text
    /// 5
    /// -2.5
    /// ```
    NumericLiteral(f64),

    /// Size of a string, byte string, array, object or record (`length`)
    Length,

    /// A single selector
    Selector(Selector),

    /// Selectors applied left to right
    ///
    /// # Example
    /// ```text
    /// .a.b[0]
    /// ```
    SelectorChain(Vec<Selector>),

    /// Numeric binary operation
    ///
    /// # Example
    /// ```text
    /// .price * 2
    /// ```
    BinaryOp {
        left: Box<Filter>,
        op: BinOp,
        right: Box<Filter>,
    },

    /// Comma composition; every member sees the same input
    ///
    /// # Example
    /// ```text
    /// .foo, .bar
    /// ```
    ParallelGroup(Vec<Filter>),

    /// Object construction, keys are literal names
    ///
    /// # Example
    /// ```text
    /// {name: .user.name, n: .items | length}
    /// ```
    ObjectMapping(Vec<(String, Filter)>),

    /// Pipe composition; each stage consumes the previous stage's output
    ///
    /// # Example
    /// ```text
    /// .a | length
    /// ```
    FilterChain(Vec<Filter>),
}

impl Filter {
    /// Short node name, used in trace output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Filter::StringLiteral(_) => "string_literal",
            Filter::NumericLiteral(_) => "numeric_literal",
            Filter::Length => "length",
            Filter::Selector(Selector::Identity) => "identity",
            Filter::Selector(Selector::Key(_)) => "key_selector",
            Filter::Selector(Selector::Index(_)) => "index_selector",
            Filter::Selector(Selector::Range(_)) => "index_range_selector",
            Filter::SelectorChain(_) => "selector_chain",
            Filter::BinaryOp { .. } => "binary_op",
            Filter::ParallelGroup(_) => "parallel_group",
            Filter::ObjectMapping(_) => "object_mapping",
            Filter::FilterChain(_) => "filter_chain",
        }
    }
}

/// Whether `text` can be written without quotes and still read back as text.
fn is_bare_word(text: &str) -> bool {
    !text.is_empty()
        && text != "length"
        && !text.starts_with(|c: char| c.is_ascii_digit())
        && !text
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || TokenKind::from_char(c).is_some())
}

fn write_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    if is_bare_word(text) {
        f.write_str(text)
    } else {
        write!(f, "\"{}\"", text)
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all {
            return f.write_str("[:]");
        }
        match self.stop {
            Some(stop) => write!(f, "[{}:{}]", self.start, stop),
            None => write!(f, "[{}:]", self.start),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Identity => f.write_str("."),
            Selector::Key(name) => {
                f.write_str(".")?;
                write_text(f, name)
            }
            Selector::Index(i) => write!(f, "[{}]", i),
            Selector::Range(range) => range.fmt(f),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::StringLiteral(s) => write!(f, "\"{}\"", s),
            Filter::NumericLiteral(n) => write!(f, "{}", n),
            Filter::Length => f.write_str("length"),
            Filter::Selector(selector) => selector.fmt(f),
            Filter::SelectorChain(selectors) => {
                for selector in selectors {
                    selector.fmt(f)?;
                }
                Ok(())
            }
            Filter::BinaryOp { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Filter::ParallelGroup(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    member.fmt(f)?;
                }
                Ok(())
            }
            Filter::ObjectMapping(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_text(f, key)?;
                    write!(f, ": {}", value)?;
                }
                f.write_str("}")
            }
            Filter::FilterChain(stages) => {
                for (i, stage) in stages.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    stage.fmt(f)?;
                }
                Ok(())
            }
        }
    }
}
