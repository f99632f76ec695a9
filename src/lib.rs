pub mod apply;
pub mod ast;
pub mod cli;
pub mod evaluator;
pub mod lexer;
pub mod link;
pub mod parser;
pub mod stream;
pub mod value;

pub use apply::{Error, Options, apply, apply_with};
pub use ast::{BinOp, Filter, IndexRange, Position, Selector, Token, TokenKind};
pub use evaluator::{EvalError, Evaluator, materialize};
pub use lexer::{LexError, Lexer, tokenize};
pub use link::{Link, LinkError, Resolve};
pub use parser::{ParseError, Parser, parse};
pub use stream::Stream;
pub use value::{FieldDef, Record, RecordType, Value};
