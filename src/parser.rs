use thiserror::Error;

use crate::{
    ast::{BinOp, Filter, IndexRange, Position, Selector, Token, TokenKind},
    lexer::{LexError, Lexer},
};

/// Default limit on nested `{ ... }` mappings.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Errors that abort parsing. No partial tree is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected {found} at {}, expected {expected}", .found.position)]
    UnexpectedToken { found: Token, expected: &'static str },

    #[error("unexpected end of input at {position}, expected {expected}")]
    UnexpectedEnd {
        expected: &'static str,
        position: Position,
    },

    #[error("invalid index '{text}' at {position}: expected a non-negative integer")]
    InvalidIndex { text: String, position: Position },

    #[error("invalid number '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },

    #[error("unsupported operator '{operator}' at {position}")]
    UnsupportedOperator { operator: String, position: Position },

    #[error("mappings nested deeper than {limit} levels at {position}")]
    TooDeep { limit: usize, position: Position },
}

impl ParseError {
    /// Where in the expression the error was detected.
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(LexError::UnterminatedString { position }) => *position,
            ParseError::UnexpectedToken { found, .. } => found.position,
            ParseError::UnexpectedEnd { position, .. }
            | ParseError::InvalidIndex { position, .. }
            | ParseError::InvalidNumber { position, .. }
            | ParseError::UnsupportedOperator { position, .. }
            | ParseError::TooDeep { position, .. } => *position,
        }
    }
}

fn unexpected(token: Token, expected: &'static str) -> ParseError {
    if token.is(TokenKind::Eof) {
        ParseError::UnexpectedEnd {
            expected,
            position: token.position,
        }
    } else {
        ParseError::UnexpectedToken {
            found: token,
            expected,
        }
    }
}

fn parse_number(token: &Token) -> Result<f64, ParseError> {
    token
        .text
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            text: token.text.clone(),
            position: token.position,
        })
}

fn parse_index(token: &Token) -> Result<usize, ParseError> {
    token
        .text
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidIndex {
            text: token.text.clone(),
            position: token.position,
        })
}

/// Collapses a one-element list into the element itself.
fn single_or<T>(mut items: Vec<T>, wrap: impl FnOnce(Vec<T>) -> T) -> T {
    if items.len() == 1
        && let Some(item) = items.pop()
    {
        return item;
    }
    wrap(items)
}

/// Recursive-descent parser over a [`Lexer`].
///
/// Lookahead is a single pushed-back token: a production reads the next
/// token, and hands it back with `unread` when it belongs to someone else.
pub struct Parser {
    lexer: Lexer,
    pushed_back: Option<Token>,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Parser::with_max_depth(lexer, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(lexer: Lexer, max_depth: usize) -> Self {
        Parser {
            lexer,
            pushed_back: None,
            depth: 0,
            max_depth,
        }
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        match self.pushed_back.take() {
            Some(token) => Ok(token),
            None => Ok(self.lexer.next_token()?),
        }
    }

    fn unread(&mut self, token: Token) {
        debug_assert!(self.pushed_back.is_none(), "only one token of pushback");
        self.pushed_back = Some(token);
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        let token = self.next()?;
        if token.is(kind) {
            Ok(token)
        } else {
            Err(unexpected(token, expected))
        }
    }

    /// Parses a complete program into its comma-separated chains.
    ///
    /// # Examples
    ///
    /// ```
    /// use sieve_lang::{Lexer, Parser};
    ///
    /// let mut parser = Parser::new(Lexer::new(".foo, .bar | length"));
    /// let chains = parser.parse_program().unwrap();
    /// assert_eq!(chains.len(), 2);
    /// ```
    pub fn parse_program(&mut self) -> Result<Vec<Filter>, ParseError> {
        let mut chains = vec![self.parse_chain()?];

        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Comma => chains.push(self.parse_chain()?),
                TokenKind::Eof => return Ok(chains),
                _ => return Err(unexpected(token, "',', '|' or end of input")),
            }
        }
    }

    /// Parses a complete program into a single filter; several chains become
    /// a [`Filter::ParallelGroup`].
    pub fn parse(&mut self) -> Result<Filter, ParseError> {
        let chains = self.parse_program()?;
        Ok(single_or(chains, Filter::ParallelGroup))
    }

    fn parse_chain(&mut self) -> Result<Filter, ParseError> {
        let mut stages = vec![self.parse_additive()?];

        loop {
            let token = self.next()?;
            if token.is(TokenKind::Pipe) {
                stages.push(self.parse_additive()?);
            } else {
                self.unread(token);
                break;
            }
        }
        Ok(single_or(stages, Filter::FilterChain))
    }

    fn parse_additive(&mut self) -> Result<Filter, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Plus => {
                    let right = self.parse_multiplicative()?;
                    left = Filter::BinaryOp {
                        left: Box::new(left),
                        op: BinOp::Add,
                        right: Box::new(right),
                    };
                }
                TokenKind::Minus | TokenKind::Slash => {
                    return Err(ParseError::UnsupportedOperator {
                        operator: token.text,
                        position: token.position,
                    });
                }
                _ => {
                    self.unread(token);
                    return Ok(left);
                }
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Filter, ParseError> {
        let mut left = self.parse_operand()?;

        loop {
            let token = self.next()?;
            if !token.is(TokenKind::Star) {
                self.unread(token);
                return Ok(left);
            }
            let right = self.parse_operand()?;
            left = Filter::BinaryOp {
                left: Box::new(left),
                op: BinOp::Multiply,
                right: Box::new(right),
            };
        }
    }

    fn parse_operand(&mut self) -> Result<Filter, ParseError> {
        let token = self.next()?;

        match token.kind {
            TokenKind::Dot | TokenKind::LBracket => {
                self.unread(token);
                self.parse_selectors()
            }
            TokenKind::Number => Ok(Filter::NumericLiteral(parse_number(&token)?)),
            // A sign is only accepted directly before a number.
            TokenKind::Minus => {
                let number = self.next()?;
                if number.is(TokenKind::Number) {
                    Ok(Filter::NumericLiteral(-parse_number(&number)?))
                } else {
                    Err(unexpected(number, "a number after '-'"))
                }
            }
            TokenKind::Quoted => Ok(Filter::StringLiteral(token.text)),
            TokenKind::Text if token.text == "length" => Ok(Filter::Length),
            TokenKind::Text => Ok(Filter::StringLiteral(token.text)),
            TokenKind::LBrace => self.parse_mapping(token.position),
            _ => Err(unexpected(token, "a filter")),
        }
    }

    fn parse_selectors(&mut self) -> Result<Filter, ParseError> {
        let mut selectors = Vec::new();

        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Dot => {
                    let name = self.next()?;
                    match name.kind {
                        TokenKind::Text | TokenKind::Quoted | TokenKind::Number => {
                            selectors.push(Selector::Key(name.text));
                        }
                        // A dot on its own only separates segments.
                        _ => self.unread(name),
                    }
                }
                TokenKind::LBracket => selectors.push(self.parse_brackets()?),
                _ => {
                    self.unread(token);
                    break;
                }
            }
        }

        if selectors.is_empty() {
            selectors.push(Selector::Identity);
        }
        if selectors.len() == 1
            && let Some(selector) = selectors.pop()
        {
            return Ok(Filter::Selector(selector));
        }
        Ok(Filter::SelectorChain(selectors))
    }

    /// Parses bracket contents after `[`, up to and including `]`.
    fn parse_brackets(&mut self) -> Result<Selector, ParseError> {
        let mut start = None;
        let mut stop = None;
        let mut colon = false;

        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Number if !colon && start.is_none() => {
                    start = Some(parse_index(&token)?);
                }
                TokenKind::Number if colon && stop.is_none() => {
                    stop = Some(parse_index(&token)?);
                }
                TokenKind::Colon if !colon => colon = true,
                TokenKind::RBracket => break,
                _ => return Err(unexpected(token, "an index, ':' or ']'")),
            }
        }

        let selector = match (colon, start, stop) {
            (false, Some(index), _) => Selector::Index(index),
            // `[]` and `[:]`
            (_, None, None) => Selector::Range(IndexRange::all()),
            (_, start, stop) => Selector::Range(IndexRange::new(start.unwrap_or(0), stop)),
        };
        Ok(selector)
    }

    fn parse_mapping(&mut self, open: Position) -> Result<Filter, ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.max_depth,
                position: open,
            });
        }

        let mut entries = Vec::new();
        let first = self.next()?;
        if !first.is(TokenKind::RBrace) {
            self.unread(first);
            loop {
                let key = self.next()?;
                let key = match key.kind {
                    TokenKind::Text | TokenKind::Quoted | TokenKind::Number => key.text,
                    _ => return Err(unexpected(key, "a mapping key")),
                };
                self.expect(TokenKind::Colon, "':'")?;
                let value = self.parse_chain()?;
                entries.push((key, value));

                let token = self.next()?;
                match token.kind {
                    TokenKind::Comma => continue,
                    TokenKind::RBrace => break,
                    _ => return Err(unexpected(token, "',' or '}'")),
                }
            }
        }

        self.depth -= 1;
        Ok(Filter::ObjectMapping(entries))
    }
}

/// Parses `input` into a filter with the default nesting limit.
pub fn parse(input: &str) -> Result<Filter, ParseError> {
    Parser::new(Lexer::new(input)).parse()
}
