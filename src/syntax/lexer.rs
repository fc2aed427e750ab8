//! Tokenizer for s-expression source text.
//!
//! Produces the full token stream up front. Comments run from `;` to end of
//! line. Atoms are split on whitespace, parentheses and quotes; an atom that
//! parses as a decimal integer (with optional leading sign) becomes a
//! number, anything else a symbol.

use crate::diagnostics::{Diagnostic, Position};
use crate::syntax::token::{Token, TokenKind};

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 0,
        }
    }

    /// Tokenizes the whole input. Stops at the first lexical error.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let position = self.position();
            let Some(&ch) = self.chars.peek() else {
                break;
            };
            match ch {
                '(' => {
                    self.advance();
                    tokens.push(Token::new(TokenKind::LParen, position));
                }
                ')' => {
                    self.advance();
                    tokens.push(Token::new(TokenKind::RParen, position));
                }
                '"' => tokens.push(self.read_string(position)?),
                _ => tokens.push(self.read_atom(position)),
            }
        }
        Ok(tokens)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == ';' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, position: Position) -> Result<Token, Diagnostic> {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(Token::new(TokenKind::StringLit(text), position)),
                Some('\\') => match self.advance() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => break,
                },
                Some(c) => text.push(c),
                None => break,
            }
        }
        Err(Diagnostic::error("unterminated string literal")
            .with_position(position)
            .with_hint("add a closing '\"'"))
    }

    fn read_atom(&mut self, position: Position) -> Token {
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' || ch == ';' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        let kind = match classify_number(&text) {
            Some(n) => TokenKind::Number(n),
            None => TokenKind::Symbol(text),
        };
        Token::new(kind, position)
    }
}

/// `None` when the atom is not a decimal integer. A bare sign is a symbol.
fn classify_number(atom: &str) -> Option<i32> {
    let digits = atom.strip_prefix(['+', '-']).unwrap_or(atom);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    atom.parse().ok()
}
