//! SQL lexer.
//!
//! Produces a stream of tokens from SQL text. Comments (including optimizer
//! hints) are skipped; the rewriter works on the raw text and handles hints
//! on its own.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
