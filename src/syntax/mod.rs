//! Source text to heap-resident expressions: tokenizer and reader.

pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use parser::{read_all, ReadError};
pub use token::{Token, TokenKind};
