//! Abstract syntax tree for the supported statements.

mod expression;
mod inspect;
mod statement;

pub use expression::{BinaryOp, Expr, FunctionCall, Literal, Placeholder, UnaryOp};
pub use inspect::{Aggregate, BoundTable};
pub use statement::{
    Assignment, DeleteStatement, InsertSource, InsertStatement, JoinClause, JoinType, OrderBy,
    OrderDirection, SelectColumn, SelectStatement, Statement, TableRef, UpdateStatement,
};
