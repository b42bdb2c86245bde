//! # shardline-sql
//!
//! The SQL front end of shardline: a hand-written lexer, a recursive descent
//! parser with Pratt expression parsing, and the AST the router and merger
//! inspect.
//!
//! Only the four DML statement kinds are accepted. Anything else that starts
//! with a recognizable keyword (DDL, transaction control, set operations) is
//! reported as [`ParseErrorKind::UnsupportedStatement`]; everything else that
//! fails to parse is a [`ParseErrorKind::Syntax`] error.
//!
//! ```rust
//! use shardline_sql::{Parser, Statement};
//!
//! let stmt = Parser::new("SELECT id FROM orders WHERE user_id = ?")
//!     .parse_statement()
//!     .unwrap();
//! assert!(matches!(stmt, Statement::Select(_)));
//! assert!(stmt.table_names().contains("orders"));
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Expr, Statement};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ParseError, ParseErrorKind, Parser};
