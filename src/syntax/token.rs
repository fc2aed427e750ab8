use std::fmt;

use crate::diagnostics::Position;

/// Lexical token kinds for the s-expression reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Number(i32),
    Symbol(String),
    StringLit(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::Symbol(name) => write!(f, "symbol '{name}'"),
            TokenKind::StringLit(_) => write!(f, "string literal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}
