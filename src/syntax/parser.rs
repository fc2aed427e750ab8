//! Reader: token stream to heap-resident expression trees.
//!
//! Expressions are built directly in the object heap as cons chains, so the
//! evaluator and collector see parsed source the same way they see any
//! other value. No collection runs while the reader holds unrooted
//! intermediate cells; callers root the finished tree before collecting.

use crate::diagnostics::Diagnostic;
use crate::runtime::mem::heap::ObjectHeap;
use crate::runtime::mem::MemError;
use crate::runtime::value::ValueRef;
use crate::syntax::lexer::Lexer;
use crate::syntax::token::{Token, TokenKind};

/// Nesting depth cap for the recursive reader.
const MAX_NESTING_DEPTH: usize = 100;

/// A read failure: either malformed source or the heap ran out while
/// building the tree.
#[derive(Debug)]
pub enum ReadError {
    Syntax(Diagnostic),
    Mem(MemError),
}

impl From<Diagnostic> for ReadError {
    fn from(diag: Diagnostic) -> Self {
        ReadError::Syntax(diag)
    }
}

impl From<MemError> for ReadError {
    fn from(err: MemError) -> Self {
        ReadError::Mem(err)
    }
}

/// Reads every expression in `source` into `heap`.
pub fn read_all(heap: &mut ObjectHeap, source: &str) -> Result<Vec<ValueRef>, ReadError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut exprs = Vec::new();
    while !parser.at_end() {
        exprs.push(parser.parse_expr(heap, 0)?);
    }
    Ok(exprs)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_expr(&mut self, heap: &mut ObjectHeap, depth: usize) -> Result<ValueRef, ReadError> {
        let Some(token) = self.next() else {
            return Err(Diagnostic::error("unexpected end of input").into());
        };
        if depth > MAX_NESTING_DEPTH {
            return Err(Diagnostic::error("expression nested too deeply")
                .with_position(token.position)
                .into());
        }
        match token.kind {
            TokenKind::LParen => self.parse_list(heap, token, depth),
            TokenKind::RParen => Err(Diagnostic::error("unexpected ')'")
                .with_position(token.position)
                .into()),
            TokenKind::Number(n) => Ok(heap.make_number(n)?),
            TokenKind::StringLit(text) => Ok(heap.make_string(&text)?),
            TokenKind::Symbol(name) => Ok(heap.make_symbol(&name)?),
        }
    }

    fn parse_list(
        &mut self,
        heap: &mut ObjectHeap,
        open: Token,
        depth: usize,
    ) -> Result<ValueRef, ReadError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(token) if token.kind == TokenKind::RParen => {
                    self.next();
                    break;
                }
                Some(_) => items.push(self.parse_expr(heap, depth + 1)?),
                None => {
                    return Err(Diagnostic::error("unclosed list")
                        .with_position(open.position)
                        .with_hint("add a closing ')'")
                        .into());
                }
            }
        }
        // Fold right so the chain reads in source order.
        let mut list = ValueRef::Nil;
        for item in items.into_iter().rev() {
            list = heap.make_cons(item, list)?;
        }
        Ok(list)
    }
}
