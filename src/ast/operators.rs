use std::fmt;

/// Binary operators.
///
/// Only numeric multiplication and addition are defined; `-` and `/` are
/// tokenized but rejected by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// Multiplication (`*`)
    Multiply,
    /// Addition (`+`)
    Add,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Multiply => "*",
            BinOp::Add => "+",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
