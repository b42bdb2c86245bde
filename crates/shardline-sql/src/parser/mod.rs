//! SQL parser.
//!
//! A recursive descent parser with Pratt expression parsing, limited to
//! the DML subset: `SELECT`, `INSERT`, `UPDATE` and `DELETE`.

mod error;
#[allow(clippy::module_inception)]
mod parser;
mod pratt;

pub use error::{ParseError, ParseErrorKind};
pub use parser::{Parser, parse};
