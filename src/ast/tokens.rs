use std::fmt;

/// Location of a token in the expression source.
///
/// `line` and `column` are 1-based; `offset` is the 0-based character offset
/// into the expression as given. Carriage returns count towards `offset` but
/// not towards `column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Position {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input
    Eof,

    /// Unquoted run of text
    ///
    /// # Examples
    /// ```text
    /// length
    /// name
    /// 3abc
    /// ```
    Text,

    /// Double-quoted text, returned verbatim without the quotes
    ///
    /// # Examples
    /// ```text
    /// "swoosh"
    /// "a key with spaces"
    /// ```
    Quoted,

    /// Run of digits with an optional fractional part
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// ```
    Number,

    /// Selector prefix (`.`)
    Dot,

    /// Parallel composition (`,`)
    Comma,

    /// Range separator and mapping key separator (`:`)
    Colon,

    /// Pipe composition (`|`)
    Pipe,

    LBracket,
    RBracket,
    LBrace,
    RBrace,

    /// Addition (`+`)
    Plus,

    /// Recognized but not a supported operator (`-`), except as a sign
    Minus,

    /// Multiplication (`*`)
    Star,

    /// Recognized but not a supported operator (`/`)
    Slash,
}

impl TokenKind {
    /// Punctuation character for single-character kinds.
    pub fn from_char(ch: char) -> Option<TokenKind> {
        let kind = match ch {
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '|' => TokenKind::Pipe,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            _ => return None,
        };
        Some(kind)
    }
}

/// A lexical token: its kind, source text and where it starts.
///
/// Punctuation tokens carry their character as `text`; the end token carries
/// an empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Quoted => write!(f, "\"{}\"", self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}
