//! Read-only queries over parsed statements: which tables they touch, what
//! they project, which predicate guards them.

use std::collections::BTreeSet;

use super::{Expr, InsertSource, SelectStatement, Statement, TableRef};

/// A plain table bound in a statement's own `FROM` / target position,
/// together with the alias it was given there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundTable<'a> {
    pub name: &'a str,
    pub alias: Option<&'a str>,
}

impl BoundTable<'_> {
    /// Whether a column qualifier such as the `o` in `o.id` names this table.
    #[must_use]
    pub fn answers_to(&self, qualifier: &str) -> bool {
        self.alias
            .is_some_and(|alias| alias.eq_ignore_ascii_case(qualifier))
            || self.name.eq_ignore_ascii_case(qualifier)
    }
}

/// Aggregate functions whose per-shard results can be re-reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Count,
    Sum,
    Max,
    Min,
    Avg,
}

impl Aggregate {
    /// Maps a function name (any case) to an aggregate.
    #[must_use]
    pub fn from_function_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Some(Self::Count),
            "SUM" => Some(Self::Sum),
            "MAX" => Some(Self::Max),
            "MIN" => Some(Self::Min),
            "AVG" => Some(Self::Avg),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::Avg => "AVG",
        }
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase()
}

fn collect_from_expr(expr: &Expr, out: &mut BTreeSet<String>) {
    expr.for_each_subquery(&mut |query| query.collect_table_names(out));
}

fn collect_from_table_ref(table: &TableRef, out: &mut BTreeSet<String>) {
    match table {
        TableRef::Table { name, .. } => {
            out.insert(normalize(name));
        }
        TableRef::Subquery { query, .. } => query.collect_table_names(out),
        TableRef::Join { left, join } => {
            collect_from_table_ref(left, out);
            collect_from_table_ref(&join.table, out);
            if let Some(on) = &join.on {
                collect_from_expr(on, out);
            }
        }
    }
}

fn bind_table_ref<'a>(table: &'a TableRef, out: &mut Vec<BoundTable<'a>>) {
    match table {
        TableRef::Table { name, alias, .. } => out.push(BoundTable {
            name: name.as_str(),
            alias: alias.as_deref(),
        }),
        TableRef::Subquery { .. } => {}
        TableRef::Join { left, join } => {
            bind_table_ref(left, out);
            bind_table_ref(&join.table, out);
        }
    }
}

impl SelectStatement {
    /// Adds every table referenced anywhere in this query, subqueries
    /// included, lower-cased.
    pub fn collect_table_names(&self, out: &mut BTreeSet<String>) {
        if let Some(from) = &self.from {
            collect_from_table_ref(from, out);
        }
        let exprs = self
            .columns
            .iter()
            .map(|c| &c.expr)
            .chain(self.where_clause.iter())
            .chain(self.group_by.iter())
            .chain(self.having.iter())
            .chain(self.order_by.iter().map(|o| &o.expr));
        for expr in exprs {
            collect_from_expr(expr, out);
        }
    }

    #[must_use]
    pub fn table_names(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_table_names(&mut out);
        out
    }

    /// Plain tables of this query's own `FROM` clause, joins included.
    /// Tables inside subqueries are not bound here.
    #[must_use]
    pub fn bound_tables(&self) -> Vec<BoundTable<'_>> {
        let mut out = Vec::new();
        if let Some(from) = &self.from {
            bind_table_ref(from, &mut out);
        }
        out
    }

    /// The aggregate computed by a select list made of exactly one
    /// aggregate function call.
    #[must_use]
    pub fn aggregate(&self) -> Option<Aggregate> {
        let [column] = self.columns.as_slice() else {
            return None;
        };
        match column.expr.unparenthesized() {
            Expr::Function(call) => Aggregate::from_function_name(&call.name),
            _ => None,
        }
    }

    /// Whether the select list contains `*` or `table.*`.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c.expr, Expr::Wildcard { .. }))
    }
}

impl Statement {
    /// Every logical table the statement references, at any depth,
    /// lower-cased.
    #[must_use]
    pub fn table_names(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        match self {
            Self::Select(select) => select.collect_table_names(&mut out),
            Self::Insert(insert) => {
                out.insert(normalize(&insert.table));
                match &insert.source {
                    InsertSource::Values(rows) => {
                        for expr in rows.iter().flatten() {
                            collect_from_expr(expr, &mut out);
                        }
                    }
                    InsertSource::Query(query) => query.collect_table_names(&mut out),
                    InsertSource::DefaultValues => {}
                }
                for assignment in &insert.on_duplicate {
                    collect_from_expr(&assignment.value, &mut out);
                }
            }
            Self::Update(update) => {
                out.insert(normalize(&update.table));
                for assignment in &update.assignments {
                    collect_from_expr(&assignment.value, &mut out);
                }
                if let Some(where_clause) = &update.where_clause {
                    collect_from_expr(where_clause, &mut out);
                }
            }
            Self::Delete(delete) => {
                out.insert(normalize(&delete.table));
                if let Some(where_clause) = &delete.where_clause {
                    collect_from_expr(where_clause, &mut out);
                }
            }
        }
        out
    }

    /// Tables bound at the statement's own level.
    #[must_use]
    pub fn bound_tables(&self) -> Vec<BoundTable<'_>> {
        match self {
            Self::Select(select) => select.bound_tables(),
            Self::Insert(insert) => vec![BoundTable {
                name: &insert.table,
                alias: None,
            }],
            Self::Update(update) => vec![BoundTable {
                name: &update.table,
                alias: update.alias.as_deref(),
            }],
            Self::Delete(delete) => vec![BoundTable {
                name: &delete.table,
                alias: delete.alias.as_deref(),
            }],
        }
    }

    /// The `WHERE` predicate, if the statement kind has one and it is set.
    #[must_use]
    pub const fn where_clause(&self) -> Option<&Expr> {
        match self {
            Self::Select(select) => select.where_clause.as_ref(),
            Self::Update(update) => update.where_clause.as_ref(),
            Self::Delete(delete) => delete.where_clause.as_ref(),
            Self::Insert(_) => None,
        }
    }

    #[must_use]
    pub const fn as_select(&self) -> Option<&SelectStatement> {
        match self {
            Self::Select(select) => Some(select),
            _ => None,
        }
    }

    /// Statement keyword, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
        }
    }
}
