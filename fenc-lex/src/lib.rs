//! fenc-lex - the scanner.
//!
//! Turns a source buffer into a stream of tokens, one character of
//! lookahead at a time, reporting nothing itself — lexical errors come
//! back as `Token { kind: TokenKind::Error, .. }` for the compiler to
//! turn into a diagnostic at the point of use.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
