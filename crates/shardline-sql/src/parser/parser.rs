//! Recursive descent parser for the DML subset shardline routes.

use super::error::ParseError;
use super::pratt::{
    infix_binding_power, prefix_binding_power, token_to_binary_op, token_to_unary_op,
};
use crate::ast::{
    Assignment, BinaryOp, DeleteStatement, Expr, FunctionCall, InsertSource, InsertStatement,
    JoinClause, JoinType, Literal, OrderBy, OrderDirection, Placeholder, SelectColumn,
    SelectStatement, Statement, TableRef, UnaryOp, UpdateStatement,
};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};

/// Leading words of statements that are recognized but not handled.
const UNSUPPORTED_STATEMENTS: &[&str] = &[
    "ALTER", "ANALYZE", "BEGIN", "CALL", "COMMIT", "CREATE", "DEALLOCATE", "DESCRIBE", "DO",
    "DROP", "EXECUTE", "EXPLAIN", "FLUSH", "GRANT", "HANDLER", "KILL", "LOAD", "LOCK", "MERGE",
    "OPTIMIZE", "PRAGMA", "PREPARE", "RELEASE", "RENAME", "REPLACE", "RESET", "REVOKE",
    "ROLLBACK", "SAVEPOINT", "SHOW", "START", "TRUNCATE", "UNLOCK", "USE", "VACUUM",
];

/// SQL parser over a single statement.
///
/// Positional `?` placeholders are numbered in source order starting at 0,
/// which is the order drivers bind them in.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    next_ordinal: usize,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            next_ordinal: 0,
        }
    }

    /// Parses exactly one statement, optionally followed by `;`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] of kind
    /// [`UnsupportedStatement`](super::ParseErrorKind::UnsupportedStatement)
    /// for DDL and other non-DML statements, and of kind
    /// [`Syntax`](super::ParseErrorKind::Syntax) for anything malformed.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let statement = match &self.current.kind {
            TokenKind::Keyword(Keyword::Select) => Statement::Select(self.parse_select()?),
            TokenKind::Keyword(Keyword::Insert) => Statement::Insert(self.parse_insert()?),
            TokenKind::Keyword(Keyword::Update) => Statement::Update(self.parse_update()?),
            TokenKind::Keyword(Keyword::Delete) => Statement::Delete(self.parse_delete()?),
            TokenKind::Keyword(kw @ (Keyword::Set | Keyword::With | Keyword::Desc)) => {
                return Err(ParseError::unsupported(kw.as_str(), self.current.span));
            }
            TokenKind::Identifier(word)
                if UNSUPPORTED_STATEMENTS
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(word)) =>
            {
                return Err(ParseError::unsupported(
                    &word.to_ascii_uppercase(),
                    self.current.span,
                ));
            }
            _ => {
                return Err(ParseError::unexpected(
                    "SELECT, INSERT, UPDATE or DELETE",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };
        self.finish()?;
        Ok(statement)
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        while self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        match &self.current.kind {
            TokenKind::Eof => Ok(()),
            TokenKind::Keyword(kw @ (Keyword::Union | Keyword::Intersect | Keyword::Except)) => {
                Err(ParseError::unsupported(
                    &format!("{} set operation", kw.as_str()),
                    self.current.span,
                ))
            }
            other => Err(ParseError::unexpected(
                "end of statement",
                other.clone(),
                self.current.span,
            )),
        }
    }

    fn parse_select(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect_keyword(Keyword::Select)?;

        let distinct = if self.eat_keyword(Keyword::Distinct) {
            true
        } else {
            self.eat_keyword(Keyword::All);
            false
        };

        let columns = self.parse_select_columns()?;

        let from = if self.eat_keyword(Keyword::From) {
            Some(self.parse_from()?)
        } else {
            None
        };

        let where_clause = self.parse_optional_where()?;

        let group_by = if self.eat_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            self.parse_expression_list()?
        } else {
            vec![]
        };

        let having = if self.eat_keyword(Keyword::Having) {
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let order_by = if self.eat_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()?
        } else {
            vec![]
        };

        let (limit, mut offset) = if self.eat_keyword(Keyword::Limit) {
            let first = self.parse_expression(0)?;
            if self.eat(&TokenKind::Comma) {
                // MySQL `LIMIT offset, count`
                let count = self.parse_expression(0)?;
                (Some(count), Some(first))
            } else {
                (Some(first), None)
            }
        } else {
            (None, None)
        };
        if offset.is_none() && self.eat_keyword(Keyword::Offset) {
            offset = Some(self.parse_expression(0)?);
        }

        Ok(SelectStatement {
            distinct,
            columns,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
        })
    }

    fn parse_select_columns(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        let mut columns = vec![];
        loop {
            let expr = self.parse_expression(0)?;
            let alias = if self.eat_keyword(Keyword::As) {
                match &self.current.kind {
                    TokenKind::String(alias) => {
                        let alias = alias.clone();
                        self.advance();
                        Some(alias)
                    }
                    _ => Some(self.expect_identifier()?),
                }
            } else if matches!(self.current.kind, TokenKind::Identifier(_)) {
                Some(self.expect_identifier()?)
            } else {
                None
            };
            columns.push(SelectColumn { expr, alias });
            if !self.eat(&TokenKind::Comma) {
                return Ok(columns);
            }
        }
    }

    /// `FROM` list: comma separated join trees. The comma is a cross join.
    fn parse_from(&mut self) -> Result<TableRef, ParseError> {
        let mut table = self.parse_joined_table()?;
        while self.eat(&TokenKind::Comma) {
            let right = self.parse_joined_table()?;
            table = TableRef::Join {
                left: Box::new(table),
                join: Box::new(JoinClause {
                    join_type: JoinType::Cross,
                    table: right,
                    on: None,
                    using: vec![],
                }),
            };
        }
        Ok(table)
    }

    fn parse_joined_table(&mut self) -> Result<TableRef, ParseError> {
        let mut table = self.parse_table_factor()?;
        while self.is_join_keyword() {
            let join_type = self.parse_join_type()?;
            let right = self.parse_table_factor()?;

            let (on, using) = if join_type == JoinType::Cross {
                (None, vec![])
            } else if self.eat_keyword(Keyword::On) {
                (Some(self.parse_expression(0)?), vec![])
            } else if self.eat_keyword(Keyword::Using) {
                self.expect(&TokenKind::LeftParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                (None, columns)
            } else {
                return Err(ParseError::unexpected(
                    "ON or USING",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            };

            table = TableRef::Join {
                left: Box::new(table),
                join: Box::new(JoinClause {
                    join_type,
                    table: right,
                    on,
                    using,
                }),
            };
        }
        Ok(table)
    }

    /// A single table, a derived table, or a parenthesized join tree.
    fn parse_table_factor(&mut self) -> Result<TableRef, ParseError> {
        if self.eat(&TokenKind::LeftParen) {
            if self.check_keyword(Keyword::Select) {
                let query = self.parse_select()?;
                self.expect(&TokenKind::RightParen)?;
                let alias = self.parse_optional_alias()?;
                return Ok(TableRef::Subquery {
                    query: Box::new(query),
                    alias,
                });
            }
            let inner = self.parse_from()?;
            self.expect(&TokenKind::RightParen)?;
            return Ok(inner);
        }

        let (schema, name) = self.parse_qualified_name()?;
        let alias = self.parse_optional_alias()?;
        Ok(TableRef::Table {
            schema,
            name,
            alias,
        })
    }

    fn is_join_keyword(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Keyword(
                Keyword::Join
                    | Keyword::Inner
                    | Keyword::Left
                    | Keyword::Right
                    | Keyword::Full
                    | Keyword::Cross
            )
        )
    }

    fn parse_join_type(&mut self) -> Result<JoinType, ParseError> {
        let join_type = match self.current.as_keyword() {
            Some(Keyword::Join) => return self.advance_with(JoinType::Inner),
            Some(Keyword::Inner) => JoinType::Inner,
            Some(Keyword::Cross) => JoinType::Cross,
            Some(Keyword::Left) => JoinType::Left,
            Some(Keyword::Right) => JoinType::Right,
            Some(Keyword::Full) => JoinType::Full,
            _ => {
                return Err(ParseError::unexpected(
                    "JOIN",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };
        self.advance();
        if matches!(join_type, JoinType::Left | JoinType::Right | JoinType::Full) {
            self.eat_keyword(Keyword::Outer);
        }
        self.expect_keyword(Keyword::Join)?;
        Ok(join_type)
    }

    fn advance_with<T>(&mut self, value: T) -> Result<T, ParseError> {
        self.advance();
        Ok(value)
    }

    fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.eat_keyword(Keyword::As) || matches!(self.current.kind, TokenKind::Identifier(_)) {
            Ok(Some(self.expect_identifier()?))
        } else {
            Ok(None)
        }
    }

    /// `name` or `schema.name`.
    fn parse_qualified_name(&mut self) -> Result<(Option<String>, String), ParseError> {
        let first = self.expect_identifier()?;
        if self.eat(&TokenKind::Dot) {
            let name = self.expect_identifier()?;
            Ok((Some(first), name))
        } else {
            Ok((None, first))
        }
    }

    fn parse_optional_where(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.eat_keyword(Keyword::Where) {
            Ok(Some(self.parse_expression(0)?))
        } else {
            Ok(None)
        }
    }

    fn parse_insert(&mut self) -> Result<InsertStatement, ParseError> {
        self.expect_keyword(Keyword::Insert)?;
        self.eat_word("IGNORE");
        self.eat_keyword(Keyword::Into);

        let (schema, table) = self.parse_qualified_name()?;

        let has_column_list = self.check(&TokenKind::LeftParen)
            && !matches!(self.peek_kind(), TokenKind::Keyword(Keyword::Select));
        let columns = if has_column_list {
            self.advance();
            let columns = self.parse_identifier_list()?;
            self.expect(&TokenKind::RightParen)?;
            columns
        } else {
            vec![]
        };

        let source = if self.eat_keyword(Keyword::Values) {
            let mut rows = vec![];
            loop {
                self.expect(&TokenKind::LeftParen)?;
                let row = if self.check(&TokenKind::RightParen) {
                    vec![]
                } else {
                    self.parse_expression_list()?
                };
                self.expect(&TokenKind::RightParen)?;
                rows.push(row);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            InsertSource::Values(rows)
        } else if self.check_keyword(Keyword::Select) {
            InsertSource::Query(Box::new(self.parse_select()?))
        } else if self.eat(&TokenKind::LeftParen) {
            let query = self.parse_select()?;
            self.expect(&TokenKind::RightParen)?;
            InsertSource::Query(Box::new(query))
        } else if self.eat_keyword(Keyword::Default) {
            self.expect_keyword(Keyword::Values)?;
            InsertSource::DefaultValues
        } else {
            return Err(ParseError::unexpected(
                "VALUES, SELECT or DEFAULT VALUES",
                self.current.kind.clone(),
                self.current.span,
            ));
        };

        let on_duplicate = if self.eat_keyword(Keyword::On) {
            self.expect_word("DUPLICATE")?;
            self.expect_word("KEY")?;
            self.expect_keyword(Keyword::Update)?;
            self.parse_assignments()?
        } else {
            vec![]
        };

        Ok(InsertStatement {
            schema,
            table,
            columns,
            source,
            on_duplicate,
        })
    }

    /// Kind of the token after the current one, without consuming anything.
    fn peek_kind(&self) -> TokenKind {
        self.lexer.clone().next_token().kind
    }

    fn parse_update(&mut self) -> Result<UpdateStatement, ParseError> {
        self.expect_keyword(Keyword::Update)?;
        let (schema, table) = self.parse_qualified_name()?;
        let alias = self.parse_optional_alias()?;
        self.expect_keyword(Keyword::Set)?;
        let assignments = self.parse_assignments()?;
        let where_clause = self.parse_optional_where()?;
        Ok(UpdateStatement {
            schema,
            table,
            alias,
            assignments,
            where_clause,
        })
    }

    fn parse_assignments(&mut self) -> Result<Vec<Assignment>, ParseError> {
        let mut assignments = vec![];
        loop {
            let first = self.expect_identifier()?;
            let (table, column) = if self.eat(&TokenKind::Dot) {
                (Some(first), self.expect_identifier()?)
            } else {
                (None, first)
            };
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expression(0)?;
            assignments.push(Assignment {
                table,
                column,
                value,
            });
            if !self.eat(&TokenKind::Comma) {
                return Ok(assignments);
            }
        }
    }

    fn parse_delete(&mut self) -> Result<DeleteStatement, ParseError> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let (schema, table) = self.parse_qualified_name()?;
        let alias = self.parse_optional_alias()?;
        let where_clause = self.parse_optional_where()?;
        Ok(DeleteStatement {
            schema,
            table,
            alias,
            where_clause,
        })
    }

    fn parse_order_by_list(&mut self) -> Result<Vec<OrderBy>, ParseError> {
        let mut items = vec![];
        loop {
            let expr = self.parse_expression(0)?;
            let direction = if self.eat_keyword(Keyword::Desc) {
                OrderDirection::Desc
            } else {
                self.eat_keyword(Keyword::Asc);
                OrderDirection::Asc
            };
            items.push(OrderBy { expr, direction });
            if !self.eat(&TokenKind::Comma) {
                return Ok(items);
            }
        }
    }

    fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        while let Some((l_bp, r_bp)) = infix_binding_power(&self.current.kind) {
            if l_bp < min_bp {
                break;
            }
            lhs = match self.current.as_keyword() {
                Some(Keyword::Is) => {
                    self.advance();
                    let negated = self.eat_keyword(Keyword::Not);
                    self.expect_keyword(Keyword::Null)?;
                    Expr::IsNull {
                        expr: Box::new(lhs),
                        negated,
                    }
                }
                Some(Keyword::Not) => {
                    self.advance();
                    self.parse_negated_predicate(lhs, r_bp)?
                }
                Some(Keyword::In) => {
                    self.advance();
                    self.parse_in_list(lhs, false)?
                }
                Some(Keyword::Between) => {
                    self.advance();
                    self.parse_between(lhs, false, r_bp)?
                }
                _ => {
                    let Some(op) = token_to_binary_op(&self.current.kind) else {
                        break;
                    };
                    self.advance();
                    let rhs = self.parse_expression(r_bp)?;
                    lhs.binary(op, rhs)
                }
            };
        }

        Ok(lhs)
    }

    /// Handles `NOT IN`, `NOT BETWEEN` and `NOT LIKE` after the `NOT`.
    fn parse_negated_predicate(&mut self, lhs: Expr, r_bp: u8) -> Result<Expr, ParseError> {
        match self.current.as_keyword() {
            Some(Keyword::In) => {
                self.advance();
                self.parse_in_list(lhs, true)
            }
            Some(Keyword::Between) => {
                self.advance();
                self.parse_between(lhs, true, r_bp)
            }
            Some(Keyword::Like) => {
                self.advance();
                let rhs = self.parse_expression(r_bp)?;
                Ok(lhs.binary(BinaryOp::NotLike, rhs))
            }
            _ => Err(ParseError::unexpected(
                "IN, BETWEEN or LIKE after NOT",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    fn parse_in_list(&mut self, lhs: Expr, negated: bool) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let list = if self.check_keyword(Keyword::Select) {
            vec![Expr::Subquery(Box::new(self.parse_select()?))]
        } else {
            self.parse_expression_list()?
        };
        self.expect(&TokenKind::RightParen)?;
        Ok(Expr::In {
            expr: Box::new(lhs),
            list,
            negated,
        })
    }

    fn parse_between(&mut self, lhs: Expr, negated: bool, r_bp: u8) -> Result<Expr, ParseError> {
        let low = self.parse_expression(r_bp)?;
        self.expect_keyword(Keyword::And)?;
        let high = self.parse_expression(r_bp)?;
        Ok(Expr::Between {
            expr: Box::new(lhs),
            low: Box::new(low),
            high: Box::new(high),
            negated,
        })
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let Some(bp) = prefix_binding_power(&self.current.kind) else {
            return self.parse_primary();
        };
        let op = token_to_unary_op(&self.current.kind);
        self.advance();
        let operand = self.parse_expression(bp)?;
        Ok(match (op, operand) {
            (None, operand) => operand,
            (Some(UnaryOp::Neg), Expr::Literal(Literal::Integer(n))) => {
                Expr::Literal(Literal::Integer(-n))
            }
            (Some(UnaryOp::Neg), Expr::Literal(Literal::Float(f))) => {
                Expr::Literal(Literal::Float(-f))
            }
            (Some(UnaryOp::Not), Expr::Exists { query, negated }) => Expr::Exists {
                query,
                negated: !negated,
            },
            (Some(op), operand) => Expr::Unary {
                op,
                operand: Box::new(operand),
            },
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current.clone();
        match token.kind {
            TokenKind::Integer(n) => self.advance_with(Expr::Literal(Literal::Integer(n))),
            TokenKind::Float(f) => self.advance_with(Expr::Literal(Literal::Float(f))),
            TokenKind::String(s) => self.advance_with(Expr::Literal(Literal::String(s))),
            TokenKind::Blob(b) => self.advance_with(Expr::Literal(Literal::Blob(b))),
            TokenKind::Keyword(Keyword::True) => {
                self.advance_with(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance_with(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Null) => self.advance_with(Expr::Literal(Literal::Null)),

            TokenKind::Question => {
                let ordinal = self.next_ordinal;
                self.next_ordinal += 1;
                self.advance_with(Expr::Parameter(Placeholder::Positional(ordinal)))
            }
            TokenKind::Colon => {
                self.advance();
                let name = self.expect_identifier()?;
                Ok(Expr::Parameter(Placeholder::Named(name)))
            }

            TokenKind::Star => self.advance_with(Expr::Wildcard { table: None }),

            TokenKind::LeftParen => {
                self.advance();
                let expr = if self.check_keyword(Keyword::Select) {
                    Expr::Subquery(Box::new(self.parse_select()?))
                } else {
                    Expr::Paren(Box::new(self.parse_expression(0)?))
                };
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }

            TokenKind::Keyword(Keyword::Case) => self.parse_case(),
            TokenKind::Keyword(Keyword::Cast) => self.parse_cast(),

            TokenKind::Keyword(Keyword::Exists) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let query = self.parse_select()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Expr::Exists {
                    query: Box::new(query),
                    negated: false,
                })
            }

            // LEFT(s, n) / RIGHT(s, n)
            TokenKind::Keyword(kw @ (Keyword::Left | Keyword::Right)) => {
                self.advance();
                if self.check(&TokenKind::LeftParen) {
                    self.parse_function_call(kw.as_str().to_string())
                } else {
                    Err(ParseError::unexpected(
                        "expression",
                        TokenKind::Keyword(kw),
                        token.span,
                    ))
                }
            }

            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::LeftParen) {
                    return self.parse_function_call(name);
                }
                if self.eat(&TokenKind::Dot) {
                    if self.eat(&TokenKind::Star) {
                        return Ok(Expr::Wildcard { table: Some(name) });
                    }
                    let column_span = self.current.span;
                    let column = self.expect_identifier()?;
                    return Ok(Expr::Column {
                        table: Some(name),
                        name: column,
                        span: token.span.merge(column_span),
                    });
                }
                Ok(Expr::Column {
                    table: None,
                    name,
                    span: token.span,
                })
            }

            other => Err(ParseError::unexpected("expression", other, token.span)),
        }
    }

    fn parse_function_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let distinct = self.eat_keyword(Keyword::Distinct);
        let args = if self.check(&TokenKind::RightParen) {
            vec![]
        } else if self.eat(&TokenKind::Star) {
            vec![Expr::Wildcard { table: None }]
        } else {
            self.parse_expression_list()?
        };
        self.expect(&TokenKind::RightParen)?;
        Ok(Expr::Function(FunctionCall {
            name,
            args,
            distinct,
        }))
    }

    /// `CAST(expr AS type)`. The type is kept as text, e.g. `DECIMAL(10,2)`.
    fn parse_cast(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Cast)?;
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.parse_expression(0)?;
        self.expect_keyword(Keyword::As)?;

        let mut words = vec![];
        loop {
            match &self.current.kind {
                TokenKind::Identifier(word) => words.push(word.to_ascii_uppercase()),
                TokenKind::Keyword(kw) => words.push(kw.as_str().to_string()),
                _ => break,
            }
            self.advance();
        }
        if words.is_empty() {
            return Err(ParseError::unexpected(
                "type name",
                self.current.kind.clone(),
                self.current.span,
            ));
        }
        let mut type_name = words.join(" ");
        if self.eat(&TokenKind::LeftParen) {
            let mut sizes = vec![];
            loop {
                match self.current.kind {
                    TokenKind::Integer(n) => sizes.push(n.to_string()),
                    _ => {
                        return Err(ParseError::unexpected(
                            "integer",
                            self.current.kind.clone(),
                            self.current.span,
                        ));
                    }
                }
                self.advance();
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen)?;
            type_name = format!("{type_name}({})", sizes.join(","));
        }
        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::Cast {
            expr: Box::new(expr),
            type_name,
        })
    }

    fn parse_case(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Case)?;

        let operand = if self.check_keyword(Keyword::When) {
            None
        } else {
            Some(Box::new(self.parse_expression(0)?))
        };

        let mut when_clauses = vec![];
        while self.eat_keyword(Keyword::When) {
            let when = self.parse_expression(0)?;
            self.expect_keyword(Keyword::Then)?;
            let then = self.parse_expression(0)?;
            when_clauses.push((when, then));
        }
        if when_clauses.is_empty() {
            return Err(ParseError::unexpected(
                "WHEN",
                self.current.kind.clone(),
                self.current.span,
            ));
        }

        let else_clause = if self.eat_keyword(Keyword::Else) {
            Some(Box::new(self.parse_expression(0)?))
        } else {
            None
        };
        self.expect_keyword(Keyword::End)?;

        Ok(Expr::Case {
            operand,
            when_clauses,
            else_clause,
        })
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![];
        loop {
            exprs.push(self.parse_expression(0)?);
            if !self.eat(&TokenKind::Comma) {
                return Ok(exprs);
            }
        }
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut idents = vec![];
        loop {
            idents.push(self.expect_identifier()?);
            if !self.eat(&TokenKind::Comma) {
                return Ok(idents);
            }
        }
    }

    // --- token helpers ---

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current.as_keyword() == Some(keyword)
    }

    /// Consumes the current token if it has the given kind.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        let matched = self.check(kind);
        if matched {
            self.advance();
        }
        matched
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        let matched = self.check_keyword(keyword);
        if matched {
            self.advance();
        }
        matched
    }

    /// Consumes a non-reserved word such as `IGNORE` or `DUPLICATE`.
    fn eat_word(&mut self, word: &str) -> bool {
        let matched =
            matches!(&self.current.kind, TokenKind::Identifier(w) if w.eq_ignore_ascii_case(word));
        if matched {
            self.advance();
        }
        matched
    }

    fn expect_word(&mut self, word: &str) -> Result<(), ParseError> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(ParseError::unexpected(
                word,
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(ParseError::unexpected(
                format!("{kind:?}"),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(ParseError::unexpected(
                keyword.as_str(),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::unexpected(
                "identifier",
                other.clone(),
                self.current.span,
            )),
        }
    }
}

/// Parses one statement.
///
/// # Errors
///
/// See [`Parser::parse_statement`].
pub fn parse(sql: &str) -> Result<Statement, ParseError> {
    Parser::new(sql).parse_statement()
}
