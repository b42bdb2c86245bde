//! Expression nodes.

use super::SelectStatement;
use crate::lexer::Span;

/// A literal value as written in the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Blob(Vec<u8>),
    Boolean(bool),
    Null,
}

/// A bind placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `?`, numbered by source order starting at 0. This is the order in
    /// which drivers bind positional parameters.
    Positional(usize),
    /// `:name`
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    And,
    Or,

    Concat,
    Like,
    NotLike,

    BitAnd,
    BitOr,
    LeftShift,
    RightShift,
}

impl BinaryOp {
    /// SQL spelling of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
        }
    }

    /// True for `AND` / `OR`, the edges the router walks through.
    #[must_use]
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

/// A function call such as `COUNT(DISTINCT id)` or `LOWER(name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Name as written.
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
}

/// An SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),

    /// A column reference, optionally qualified with a table name or alias.
    Column {
        table: Option<String>,
        name: String,
        span: Span,
    },

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    Function(FunctionCall),

    /// A parenthesized scalar subquery.
    Subquery(Box<SelectStatement>),

    /// `[NOT] EXISTS (SELECT ...)`
    Exists {
        query: Box<SelectStatement>,
        negated: bool,
    },

    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expr>, negated: bool },

    /// `expr [NOT] IN (...)`. A subquery shows up as a single
    /// [`Expr::Subquery`] element.
    In {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    /// `expr [NOT] BETWEEN low AND high`
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    Case {
        operand: Option<Box<Expr>>,
        when_clauses: Vec<(Expr, Expr)>,
        else_clause: Option<Box<Expr>>,
    },

    /// `CAST(expr AS type)`; the target type is kept verbatim.
    Cast { expr: Box<Expr>, type_name: String },

    Paren(Box<Expr>),

    Parameter(Placeholder),

    /// `*` or `table.*`
    Wildcard { table: Option<String> },
}

impl Expr {
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            table: None,
            name: name.into(),
            span: Span::default(),
        }
    }

    #[must_use]
    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            table: Some(table.into()),
            name: name.into(),
            span: Span::default(),
        }
    }

    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    #[must_use]
    pub const fn positional(ordinal: usize) -> Self {
        Self::Parameter(Placeholder::Positional(ordinal))
    }

    #[must_use]
    pub fn binary(self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn eq(self, right: Self) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    #[must_use]
    pub fn and(self, right: Self) -> Self {
        self.binary(BinaryOp::And, right)
    }

    #[must_use]
    pub fn or(self, right: Self) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    #[must_use]
    pub fn in_list(self, list: Vec<Self>) -> Self {
        Self::In {
            expr: Box::new(self),
            list,
            negated: false,
        }
    }

    /// Strips any number of redundant parentheses.
    #[must_use]
    pub fn unparenthesized(&self) -> &Self {
        let mut expr = self;
        while let Self::Paren(inner) = expr {
            expr = inner;
        }
        expr
    }

    /// Calls `f` for every subquery directly reachable from this expression
    /// without descending into the subqueries themselves.
    pub fn for_each_subquery<'a>(&'a self, f: &mut impl FnMut(&'a SelectStatement)) {
        match self {
            Self::Subquery(query) | Self::Exists { query, .. } => f(&**query),
            Self::Binary { left, right, .. } => {
                left.for_each_subquery(f);
                right.for_each_subquery(f);
            }
            Self::Unary { operand: inner, .. }
            | Self::IsNull { expr: inner, .. }
            | Self::Cast { expr: inner, .. }
            | Self::Paren(inner) => inner.for_each_subquery(f),
            Self::Function(call) => {
                for arg in &call.args {
                    arg.for_each_subquery(f);
                }
            }
            Self::In { expr, list, .. } => {
                expr.for_each_subquery(f);
                for item in list {
                    item.for_each_subquery(f);
                }
            }
            Self::Between {
                expr, low, high, ..
            } => {
                expr.for_each_subquery(f);
                low.for_each_subquery(f);
                high.for_each_subquery(f);
            }
            Self::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                if let Some(operand) = operand {
                    operand.for_each_subquery(f);
                }
                for (when, then) in when_clauses {
                    when.for_each_subquery(f);
                    then.for_each_subquery(f);
                }
                if let Some(else_clause) = else_clause {
                    else_clause.for_each_subquery(f);
                }
            }
            Self::Literal(_) | Self::Column { .. } | Self::Parameter(_) | Self::Wildcard { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_compose() {
        let expr = Expr::column("user_id")
            .eq(Expr::positional(0))
            .and(Expr::qualified_column("o", "id").in_list(vec![Expr::integer(1)]));
        let Expr::Binary { op, left, right } = expr else {
            panic!("expected AND");
        };
        assert_eq!(op, BinaryOp::And);
        assert!(matches!(*left, Expr::Binary { op: BinaryOp::Eq, .. }));
        assert!(matches!(*right, Expr::In { negated: false, .. }));
    }

    #[test]
    fn test_unparenthesized() {
        let expr = Expr::Paren(Box::new(Expr::Paren(Box::new(Expr::integer(3)))));
        assert_eq!(expr.unparenthesized(), &Expr::integer(3));
    }

    #[test]
    fn test_logical_ops() {
        assert!(BinaryOp::And.is_logical());
        assert!(BinaryOp::Or.is_logical());
        assert!(!BinaryOp::Eq.is_logical());
        assert_eq!(BinaryOp::NotLike.as_str(), "NOT LIKE");
    }
}
