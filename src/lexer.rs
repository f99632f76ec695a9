use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::ast::{Position, Token, TokenKind};

static NUMBER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$"));

fn is_number(text: &str) -> bool {
    NUMBER.as_ref().is_ok_and(|re| re.is_match(text))
}

/// Errors raised while splitting an expression into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unterminated string starting at {position}")]
    UnterminatedString { position: Position },
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let mut lexer = Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        };
        lexer.skip_carriage_returns();
        lexer
    }

    /// Carriage returns never reach the scanner, but they still count
    /// towards offsets.
    fn skip_carriage_returns(&mut self) {
        while self.input.get(self.position) == Some(&'\r') {
            self.position += 1;
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input[self.position..]
            .iter()
            .copied()
            .filter(|&c| c != '\r')
            .nth(offset)
    }

    fn advance(&mut self) {
        if self.current_char() == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
        self.skip_carriage_returns();
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column, self.position)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn is_run_char(ch: char) -> bool {
        !ch.is_whitespace() && ch != '"' && TokenKind::from_char(ch).is_none()
    }

    fn read_quoted(&mut self) -> Result<String, LexError> {
        let start = self.here();
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == '"' {
                return Ok(result);
            }
            result.push(ch);
        }

        Err(LexError::UnterminatedString { position: start })
    }

    /// Reads a bare run. A run starting with digits may take one `.` when a
    /// digit follows it, so `1.5` stays a single token.
    fn read_run(&mut self) -> String {
        let mut run = String::new();
        let mut seen_point = false;

        while let Some(ch) = self.current_char() {
            if Self::is_run_char(ch) {
                run.push(ch);
                self.advance();
            } else if ch == '.'
                && !seen_point
                && !run.is_empty()
                && run.chars().all(|c| c.is_ascii_digit())
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                seen_point = true;
                run.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        run
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let position = self.here();

        match self.current_char() {
            None => Ok(Token::new(TokenKind::Eof, "", position)),
            Some('"') => {
                let text = self.read_quoted()?;
                Ok(Token::new(TokenKind::Quoted, text, position))
            }
            Some(ch) => {
                if let Some(kind) = TokenKind::from_char(ch) {
                    self.advance();
                    return Ok(Token::new(kind, ch.to_string(), position));
                }
                let text = self.read_run();
                let kind = if is_number(&text) {
                    TokenKind::Number
                } else {
                    TokenKind::Text
                };
                Ok(Token::new(kind, text, position))
            }
        }
    }
}

/// Splits `input` into tokens, including the trailing end-of-input token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.is(TokenKind::Eof);
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[test]
fn test_selector_chain() {
    let kinds: Vec<TokenKind> = tokenize(".a.b[0]")
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Dot,
            TokenKind::Text,
            TokenKind::Dot,
            TokenKind::Text,
            TokenKind::LBracket,
            TokenKind::Number,
            TokenKind::RBracket,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_positions() {
    let mut lexer = Lexer::new(".a |\n  length");
    assert_eq!(lexer.next_token().unwrap().position, Position::new(1, 1, 0));
    assert_eq!(lexer.next_token().unwrap().position, Position::new(1, 2, 1));
    assert_eq!(lexer.next_token().unwrap().position, Position::new(1, 4, 3));
    let length = lexer.next_token().unwrap();
    assert_eq!(length.text, "length");
    assert_eq!(length.position, Position::new(2, 3, 7));
}

#[test]
fn test_number_pattern() {
    assert!(NUMBER.is_ok());
    assert!(is_number("42"));
    assert!(is_number("3.14"));
    assert!(!is_number("3."));
    assert!(!is_number("3abc"));
}
