//! Recombines per-shard result sets into one logical result.
//!
//! The merge strategy is chosen from the original statement: a single
//! aggregate projection is re-reduced, `ORDER BY` is re-applied over the
//! concatenation of every shard's rows, and anything else is concatenated.
//! `LIMIT` is applied once more after merging.

use std::cmp::Ordering;
use std::ops::Index;
use std::{iter, slice, vec};

use shardline_sql::ast::{
    Aggregate, Expr, Literal, OrderDirection, SelectColumn, SelectStatement, Statement,
};
use tracing::{debug, warn};

use crate::error::{Result, ShardError};
use crate::params::ParameterSupplier;
use crate::row::{ColumnMapper, ResultRow};
use crate::value::Value;

/// How per-shard results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    Avg,
    Count,
    Max,
    Min,
    Sum,
    Distinct,
    OrderBy,
    Default,
}

impl MergeStrategy {
    /// Picks the strategy for `statement`: aggregate first, then
    /// `DISTINCT`, then `ORDER BY`.
    #[must_use]
    pub fn for_statement(statement: &Statement) -> Self {
        let Statement::Select(select) = statement else {
            return Self::Default;
        };
        if let Some(aggregate) = select.aggregate() {
            return match aggregate {
                Aggregate::Avg => Self::Avg,
                Aggregate::Count => Self::Count,
                Aggregate::Max => Self::Max,
                Aggregate::Min => Self::Min,
                Aggregate::Sum => Self::Sum,
            };
        }
        if select.distinct {
            Self::Distinct
        } else if select.order_by.is_empty() {
            Self::Default
        } else {
            Self::OrderBy
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Max => "max",
            Self::Min => "min",
            Self::Sum => "sum",
            Self::Distinct => "distinct",
            Self::OrderBy => "order_by",
            Self::Default => "default",
        }
    }
}

/// A merged result.
///
/// Concatenated results keep every shard's list in place and read them
/// back to back. Re-reduced, re-sorted and windowed results are a fresh
/// list.
#[derive(Debug, Clone)]
pub enum MergedRows<R> {
    Concat(Vec<Vec<R>>),
    Rows(Vec<R>),
}

impl<R> MergedRows<R> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups().iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups().iter().all(Vec::is_empty)
    }

    /// The row at `index` of the combined sequence.
    #[must_use]
    pub fn get(&self, mut index: usize) -> Option<&R> {
        for group in self.groups() {
            if index < group.len() {
                return group.get(index);
            }
            index -= group.len();
        }
        None
    }

    pub fn iter(&self) -> iter::Flatten<slice::Iter<'_, Vec<R>>> {
        self.groups().iter().flatten()
    }

    /// The lists backing this result: one per shard when concatenated.
    #[must_use]
    pub fn groups(&self) -> &[Vec<R>] {
        match self {
            Self::Concat(groups) => groups,
            Self::Rows(rows) => slice::from_ref(rows),
        }
    }

    /// Collects the rows into one list. A single backing list is returned
    /// as is.
    #[must_use]
    pub fn into_vec(self) -> Vec<R> {
        match self {
            Self::Rows(rows) => rows,
            Self::Concat(mut groups) if groups.len() == 1 => groups.pop().unwrap_or_default(),
            Self::Concat(groups) => groups.into_iter().flatten().collect(),
        }
    }

    fn into_groups(self) -> Vec<Vec<R>> {
        match self {
            Self::Concat(groups) => groups,
            Self::Rows(rows) => vec![rows],
        }
    }
}

impl<R> Index<usize> for MergedRows<R> {
    type Output = R;

    fn index(&self, index: usize) -> &R {
        self.get(index)
            .unwrap_or_else(|| panic!("row {index} out of range for {} rows", self.len()))
    }
}

impl<R> IntoIterator for MergedRows<R> {
    type Item = R;
    type IntoIter = iter::Flatten<vec::IntoIter<Vec<R>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_groups().into_iter().flatten()
    }
}

impl<'a, R> IntoIterator for &'a MergedRows<R> {
    type Item = &'a R;
    type IntoIter = iter::Flatten<slice::Iter<'a, Vec<R>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R: PartialEq> PartialEq for MergedRows<R> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<R: PartialEq> PartialEq<Vec<R>> for MergedRows<R> {
    fn eq(&self, other: &Vec<R>) -> bool {
        self.iter().eq(other)
    }
}

/// Merges the results of every shard statement.
///
/// Returns `None` for no results and the single result untouched when
/// there is only one. Concatenating strategies hand the shard lists back
/// as [`MergedRows::Concat`] without copying rows.
///
/// # Errors
///
/// [`ShardError::UnsupportedAggregate`] for `AVG` and unsummable values,
/// [`ShardError::UnmergeableResultShape`] when `ORDER BY` cannot be
/// evaluated on the rows, and [`ShardError::AggregateOverflow`].
pub fn merge<R: ResultRow>(
    mut results: Vec<Vec<R>>,
    statement: &Statement,
    mapper: &dyn ColumnMapper,
    params: &dyn ParameterSupplier,
) -> Result<Option<MergedRows<R>>> {
    match results.len() {
        0 => return Ok(None),
        1 => return Ok(results.pop().map(MergedRows::Rows)),
        _ => {}
    }

    let strategy = MergeStrategy::for_statement(statement);
    debug!(
        strategy = strategy.as_str(),
        shards = results.len(),
        "merging shard results"
    );
    let merged = match (strategy, statement) {
        (MergeStrategy::Avg, _) => {
            return Err(ShardError::UnsupportedAggregate(
                "AVG cannot be merged across shards".into(),
            ));
        }
        (MergeStrategy::Count, _) => MergedRows::Rows(merge_count(&results)?),
        (MergeStrategy::Sum, _) => MergedRows::Rows(merge_sum(&results)?),
        (MergeStrategy::Max, _) => MergedRows::Rows(merge_extreme(&results, Ordering::Greater)),
        (MergeStrategy::Min, _) => MergedRows::Rows(merge_extreme(&results, Ordering::Less)),
        (MergeStrategy::OrderBy, Statement::Select(select)) => {
            MergedRows::Rows(merge_ordered(results, select, mapper, params)?)
        }
        (MergeStrategy::Default, Statement::Select(select)) => merge_concatenated(results, select),
        _ => MergedRows::Concat(results),
    };
    Ok(Some(merged))
}

fn scalars<R: ResultRow>(results: &[Vec<R>]) -> impl Iterator<Item = &Value> {
    results
        .iter()
        .flatten()
        .filter_map(R::scalar)
        .filter(|v| !v.is_null())
}

fn single_row<R: ResultRow>(results: &[Vec<R>], value: Value) -> Vec<R> {
    let row = match results.iter().flatten().next() {
        Some(template) => template.with_scalar(value),
        None => R::from_scalar(value),
    };
    vec![row]
}

fn merge_count<R: ResultRow>(results: &[Vec<R>]) -> Result<Vec<R>> {
    let mut total: i64 = 0;
    for value in scalars(results) {
        let count = value.as_i64().ok_or_else(|| {
            ShardError::UnsupportedAggregate(format!("COUNT over {}", value.kind_name()))
        })?;
        total = total
            .checked_add(count)
            .ok_or_else(|| ShardError::AggregateOverflow("COUNT".into()))?;
    }
    Ok(single_row(results, Value::BigInt(total)))
}

fn merge_sum<R: ResultRow>(results: &[Vec<R>]) -> Result<Vec<R>> {
    let mut total: Option<Value> = None;
    for value in scalars(results) {
        total = Some(match total {
            None => value.clone(),
            Some(acc) => acc.checked_add(value)?,
        });
    }
    Ok(single_row(results, total.unwrap_or(Value::Null)))
}

/// MAX with `Ordering::Greater`, MIN with `Ordering::Less`.
fn merge_extreme<R: ResultRow>(results: &[Vec<R>], wanted: Ordering) -> Vec<R> {
    let best = scalars(results).fold(None::<&Value>, |best, value| match best {
        Some(b) if value.natural_cmp(b) != wanted => Some(b),
        _ => Some(value),
    });
    single_row(results, best.cloned().unwrap_or(Value::Null))
}

/// Only the `LIMIT` slice is copied out; without one the shard lists are
/// returned as they are.
fn merge_concatenated<R>(results: Vec<Vec<R>>, select: &SelectStatement) -> MergedRows<R> {
    match literal_window(select) {
        Some(window) => MergedRows::Rows(window.apply(results.into_iter().flatten())),
        None => MergedRows::Concat(results),
    }
}

fn merge_ordered<R: ResultRow>(
    results: Vec<Vec<R>>,
    select: &SelectStatement,
    mapper: &dyn ColumnMapper,
    params: &dyn ParameterSupplier,
) -> Result<Vec<R>> {
    if select.has_wildcard() {
        return Err(ShardError::UnmergeableResultShape(
            "ORDER BY over a wildcard projection".into(),
        ));
    }
    let keys: Vec<(String, OrderDirection)> = select
        .order_by
        .iter()
        .map(|order| Ok((mapper.map(&sort_key(select, &order.expr)?), order.direction)))
        .collect::<Result<_>>()?;
    let window = resolved_window(select, params)?;

    let mut decorated = results
        .into_iter()
        .flatten()
        .map(|row| {
            let values = keys
                .iter()
                .map(|(property, _)| {
                    row.property(property)
                        .or_else(|| row.scalar().filter(|_| row.is_scalar()))
                        .cloned()
                        .ok_or_else(|| {
                            ShardError::UnmergeableResultShape(format!(
                                "row has no value for ORDER BY key `{property}`"
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok((values, row))
        })
        .collect::<Result<Vec<_>>>()?;

    decorated.sort_by(|(a, _), (b, _)| {
        a.iter()
            .zip(b)
            .zip(&keys)
            .map(|((x, y), (_, direction))| match direction {
                OrderDirection::Asc => x.natural_cmp(y),
                OrderDirection::Desc => y.natural_cmp(x),
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    let rows = decorated.into_iter().map(|(_, row)| row);
    Ok(match window {
        Some(window) => window.apply(rows),
        None => rows.collect(),
    })
}

/// Resolves an ORDER BY expression to the column name or alias rows carry.
fn sort_key(select: &SelectStatement, expr: &Expr) -> Result<String> {
    match expr.unparenthesized() {
        Expr::Literal(Literal::Integer(ordinal)) => usize::try_from(*ordinal)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| select.columns.get(i))
            .and_then(projected_name)
            .ok_or_else(|| {
                ShardError::UnmergeableResultShape(format!("ORDER BY position {ordinal}"))
            }),
        Expr::Column { table, name, .. } => {
            let alias = table.is_none().then(|| {
                select
                    .columns
                    .iter()
                    .filter_map(|c| c.alias.as_deref())
                    .find(|alias| alias.eq_ignore_ascii_case(name))
            });
            if let Some(Some(alias)) = alias {
                return Ok(alias.to_string());
            }
            Ok(projected_column(select, table.as_deref(), name)
                .and_then(projected_name)
                .unwrap_or_else(|| name.clone()))
        }
        other => Err(ShardError::UnmergeableResultShape(format!(
            "ORDER BY expression {other:?} is not a projected column"
        ))),
    }
}

/// The projected column selecting `name`, preferring one whose qualifier
/// matches `table`.
fn projected_column<'a>(
    select: &'a SelectStatement,
    table: Option<&str>,
    name: &str,
) -> Option<&'a SelectColumn> {
    let mut candidates = select.columns.iter().filter(|c| {
        matches!(c.expr.unparenthesized(), Expr::Column { name: n, .. } if n.eq_ignore_ascii_case(name))
    });
    let first = candidates.next()?;
    let Some(table) = table else {
        return Some(first);
    };
    let qualified = |c: &&SelectColumn| {
        matches!(
            c.expr.unparenthesized(),
            Expr::Column { table: Some(t), .. } if t.eq_ignore_ascii_case(table)
        )
    };
    if qualified(&first) {
        return Some(first);
    }
    Some(candidates.find(qualified).unwrap_or(first))
}

fn projected_name(column: &SelectColumn) -> Option<String> {
    if let Some(alias) = &column.alias {
        return Some(alias.clone());
    }
    match column.expr.unparenthesized() {
        Expr::Column { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// Row window selected by `LIMIT` / `OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    offset: usize,
    count: Option<usize>,
}

impl Window {
    fn new(offset: Option<i64>, count: Option<i64>) -> Self {
        Self {
            offset: offset.map_or(0, |n| usize::try_from(n.max(0)).unwrap_or(usize::MAX)),
            count: count
                .filter(|n| *n >= 0)
                .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }

    fn apply<R>(self, rows: impl Iterator<Item = R>) -> Vec<R> {
        let rows = rows.skip(self.offset);
        match self.count {
            Some(count) => rows.take(count).collect(),
            None => rows.collect(),
        }
    }
}

fn literal_bound(expr: &Expr) -> Option<i64> {
    match expr.unparenthesized() {
        Expr::Literal(Literal::Integer(n)) => Some(*n),
        _ => None,
    }
}

/// The window of the concatenation path, which only honours literals.
fn literal_window(select: &SelectStatement) -> Option<Window> {
    if select.limit.is_none() && select.offset.is_none() {
        return None;
    }
    let bound = |expr: Option<&Expr>| match expr {
        None => Ok(None),
        Some(expr) => literal_bound(expr).map(Some).ok_or(()),
    };
    match (bound(select.offset.as_ref()), bound(select.limit.as_ref())) {
        (Ok(offset), Ok(count)) => Some(Window::new(offset, count)),
        _ => {
            warn!("LIMIT with placeholders is not re-applied to concatenated results");
            None
        }
    }
}

/// The window of the ORDER BY path; placeholders resolve through `params`.
fn resolved_window(
    select: &SelectStatement,
    params: &dyn ParameterSupplier,
) -> Result<Option<Window>> {
    if select.limit.is_none() && select.offset.is_none() {
        return Ok(None);
    }
    let bound = |expr: Option<&Expr>| -> Result<Option<i64>> {
        let Some(expr) = expr else {
            return Ok(None);
        };
        let value = match expr.unparenthesized() {
            Expr::Parameter(placeholder) => params
                .placeholder(placeholder)
                .and_then(Value::as_i64),
            other => literal_bound(other),
        };
        value.map(Some).ok_or_else(|| {
            ShardError::UnmergeableResultShape(format!("LIMIT bound {expr:?} is not an integer"))
        })
    };
    Ok(Some(Window::new(
        bound(select.offset.as_ref())?,
        bound(select.limit.as_ref())?,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{NoParameters, Parameters};
    use crate::row::{IdentityMapper, Row};
    use shardline_sql::Parser;

    fn statement(sql: &str) -> Statement {
        Parser::new(sql).parse_statement().unwrap()
    }

    fn ids<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Vec<i64> {
        rows.into_iter()
            .map(|r| r.get("id").and_then(Value::as_i64).unwrap())
            .collect()
    }

    fn id_rows(ids: &[i64]) -> Vec<Row> {
        ids.iter().map(|id| Row::new().with("id", *id)).collect()
    }

    #[test]
    fn test_strategy_selection() {
        let cases = [
            ("SELECT COUNT(*) FROM t", MergeStrategy::Count),
            ("SELECT sum(x) FROM t ORDER BY x", MergeStrategy::Sum),
            ("SELECT AVG(x) FROM t", MergeStrategy::Avg),
            ("SELECT DISTINCT a FROM t ORDER BY a", MergeStrategy::Distinct),
            ("SELECT a FROM t ORDER BY a", MergeStrategy::OrderBy),
            ("SELECT LOWER(a) FROM t", MergeStrategy::Default),
            ("SELECT COUNT(*), a FROM t", MergeStrategy::Default),
            ("DELETE FROM t", MergeStrategy::Default),
        ];
        for (sql, expected) in cases {
            assert_eq!(MergeStrategy::for_statement(&statement(sql)), expected, "{sql}");
        }
    }

    #[test]
    fn test_empty_and_single() {
        let stmt = statement("SELECT COUNT(*) FROM t");
        let none: Option<MergedRows<Value>> =
            merge(vec![], &stmt, &IdentityMapper, &NoParameters).unwrap();
        assert!(none.is_none());

        let only = vec![Value::Int(4)];
        let merged = merge(vec![only], &stmt, &IdentityMapper, &NoParameters).unwrap();
        assert_eq!(merged.map(MergedRows::into_vec), Some(vec![Value::Int(4)]));
    }

    #[test]
    fn test_count_and_extremes() {
        let results = || vec![vec![Value::Int(3)], vec![Value::Null], vec![Value::BigInt(9)]];
        let count = merge(results(), &statement("SELECT COUNT(*) FROM t"), &IdentityMapper, &NoParameters)
            .unwrap()
            .unwrap();
        assert_eq!(count, vec![Value::BigInt(12)]);

        let max = merge(results(), &statement("SELECT MAX(x) FROM t"), &IdentityMapper, &NoParameters)
            .unwrap()
            .unwrap();
        assert_eq!(max, vec![Value::BigInt(9)]);

        let min = merge(results(), &statement("SELECT MIN(x) FROM t"), &IdentityMapper, &NoParameters)
            .unwrap()
            .unwrap();
        assert_eq!(min, vec![Value::Int(3)]);
    }

    #[test]
    fn test_all_null_aggregates() {
        let results = || vec![vec![Value::Null], vec![]];
        let count = merge(results(), &statement("SELECT COUNT(x) FROM t"), &IdentityMapper, &NoParameters)
            .unwrap()
            .unwrap();
        assert_eq!(count, vec![Value::BigInt(0)]);
        let sum = merge(results(), &statement("SELECT SUM(x) FROM t"), &IdentityMapper, &NoParameters)
            .unwrap()
            .unwrap();
        assert_eq!(sum, vec![Value::Null]);
    }

    #[test]
    fn test_count_overflow() {
        let results = vec![vec![Value::BigInt(i64::MAX)], vec![Value::BigInt(1)]];
        let err = merge(results, &statement("SELECT COUNT(*) FROM t"), &IdentityMapper, &NoParameters)
            .unwrap_err();
        assert!(matches!(err, ShardError::AggregateOverflow(_)));
    }

    #[test]
    fn test_avg_is_rejected() {
        let results = vec![vec![Value::Int(1)], vec![Value::Int(2)]];
        let err = merge(results, &statement("SELECT AVG(x) FROM t"), &IdentityMapper, &NoParameters)
            .unwrap_err();
        assert!(matches!(err, ShardError::UnsupportedAggregate(_)));
    }

    #[test]
    fn test_aggregate_keeps_row_label() {
        let results = vec![
            vec![Row::new().with("total", 2_i64)],
            vec![Row::new().with("total", 5_i64)],
        ];
        let merged = merge(
            results,
            &statement("SELECT COUNT(*) AS total FROM t"),
            &IdentityMapper,
            &NoParameters,
        )
        .unwrap()
        .unwrap();
        assert_eq!(merged, vec![Row::new().with("total", 7_i64)]);
    }

    #[test]
    fn test_order_by_alias_and_ordinal() {
        let stmt = statement("SELECT o.user_id AS uid, o.id FROM orders o ORDER BY user_id DESC, 2");
        let results = vec![
            vec![
                Row::new().with("uid", 1).with("id", 10),
                Row::new().with("uid", 2).with("id", 30),
            ],
            vec![
                Row::new().with("uid", 2).with("id", 20),
                Row::new().with("uid", 1).with("id", 5),
            ],
        ];
        let merged = merge(results, &stmt, &IdentityMapper, &NoParameters).unwrap().unwrap();
        assert_eq!(ids(&merged), vec![20, 30, 5, 10]);
    }

    #[test]
    fn test_order_by_prefers_matching_qualifier() {
        let stmt = statement(
            "SELECT u.id AS user_key, o.id AS order_key FROM orders o JOIN users u ON o.uid = u.id ORDER BY o.id",
        );
        let Statement::Select(select) = &stmt else {
            unreachable!()
        };
        assert_eq!(sort_key(select, &select.order_by[0].expr).unwrap(), "order_key");
    }

    #[test]
    fn test_order_by_uses_mapper() {
        let stmt = statement("SELECT created_at FROM t ORDER BY created_at");
        let results = vec![
            vec![Row::new().with("createdAt", 3)],
            vec![Row::new().with("createdAt", 1)],
        ];
        let merged = merge(results, &stmt, &crate::row::CamelCaseMapper, &NoParameters)
            .unwrap()
            .unwrap();
        assert_eq!(merged[0].get("createdAt"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_order_by_is_stable() {
        let stmt = statement("SELECT k, id FROM t ORDER BY k");
        let results = vec![
            vec![Row::new().with("k", 1).with("id", 1), Row::new().with("k", 2).with("id", 2)],
            vec![Row::new().with("k", 1).with("id", 3)],
        ];
        let merged = merge(results, &stmt, &IdentityMapper, &NoParameters).unwrap().unwrap();
        assert_eq!(ids(&merged), vec![1, 3, 2]);
    }

    #[test]
    fn test_order_by_placeholder_limit() {
        let stmt = statement("SELECT id FROM t WHERE a = ? ORDER BY id LIMIT ?, ?");
        let params = Parameters::new().bind(0).bind(1).bind(2);
        let results = vec![id_rows(&[1, 4]), id_rows(&[2, 3])];
        let merged = merge(results, &stmt, &IdentityMapper, &params).unwrap().unwrap();
        assert_eq!(ids(&merged), vec![2, 3]);
    }

    #[test]
    fn test_negative_offset_clamps() {
        let stmt = statement("SELECT id FROM t ORDER BY id LIMIT 2 OFFSET -4");
        let results = vec![id_rows(&[5, 1]), id_rows(&[3])];
        let merged = merge(results, &stmt, &IdentityMapper, &NoParameters).unwrap().unwrap();
        assert_eq!(ids(&merged), vec![1, 3]);
    }

    #[test]
    fn test_order_by_expression_is_rejected() {
        let stmt = statement("SELECT id FROM t ORDER BY id + 1");
        let results = vec![id_rows(&[1]), id_rows(&[2])];
        let err = merge(results, &stmt, &IdentityMapper, &NoParameters).unwrap_err();
        assert!(matches!(err, ShardError::UnmergeableResultShape(_)));
    }

    #[test]
    fn test_missing_sort_property() {
        let stmt = statement("SELECT id FROM t ORDER BY id");
        let results = vec![vec![Row::new()], vec![Row::new()]];
        let err = merge(results, &stmt, &IdentityMapper, &NoParameters).unwrap_err();
        assert!(matches!(err, ShardError::UnmergeableResultShape(_)));
    }

    #[test]
    fn test_default_literal_limit() {
        let stmt = statement("SELECT id FROM t LIMIT 1, 2");
        let results = vec![id_rows(&[7, 8]), id_rows(&[9])];
        let merged = merge(results, &stmt, &IdentityMapper, &NoParameters).unwrap().unwrap();
        assert_eq!(ids(&merged), vec![8, 9]);
    }

    #[test]
    fn test_default_placeholder_limit_is_skipped() {
        let stmt = statement("SELECT id FROM t LIMIT ?");
        let params = Parameters::new().bind(1);
        let results = vec![id_rows(&[7, 8]), id_rows(&[9])];
        let merged = merge(results, &stmt, &IdentityMapper, &params).unwrap().unwrap();
        assert_eq!(ids(&merged), vec![7, 8, 9]);
    }

    #[test]
    fn test_distinct_concatenates() {
        let stmt = statement("SELECT DISTINCT id FROM t");
        let results = vec![id_rows(&[1, 2]), id_rows(&[2])];
        let merged = merge(results, &stmt, &IdentityMapper, &NoParameters).unwrap().unwrap();
        assert!(matches!(merged, MergedRows::Concat(_)));
        assert_eq!(ids(&merged), vec![1, 2, 2]);
    }

    #[test]
    fn test_concatenation_keeps_shard_lists() {
        let stmt = statement("SELECT id FROM t");
        let first = id_rows(&[7, 8]);
        let second = id_rows(&[9]);
        let addresses = [first.as_ptr(), second.as_ptr()];
        let merged = merge(vec![first, second], &stmt, &IdentityMapper, &NoParameters)
            .unwrap()
            .unwrap();
        let groups: Vec<_> = merged.groups().iter().map(|g| g.as_ptr()).collect();
        assert_eq!(groups, addresses);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(2).and_then(|r| r.get("id")), Some(&Value::BigInt(9)));
        assert!(merged.get(3).is_none());
        assert_eq!(merged[1].get("id"), Some(&Value::BigInt(8)));
    }

    #[test]
    fn test_merged_rows_views() {
        let concat = MergedRows::Concat(vec![vec![1, 2], vec![], vec![3]]);
        assert_eq!(concat.len(), 3);
        assert!(!concat.is_empty());
        assert_eq!(concat[2], 3);
        assert_eq!(concat, MergedRows::Rows(vec![1, 2, 3]));
        assert_eq!(concat.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(concat.clone().into_vec(), vec![1, 2, 3]);
        assert_eq!(concat.into_iter().rev().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert!(MergedRows::<i32>::Concat(vec![vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_scalar_rows_sort_by_value() {
        let stmt = statement("SELECT id FROM t ORDER BY id DESC");
        let results = vec![vec![Value::Int(1), Value::Int(4)], vec![Value::Int(3)]];
        let merged = merge(results, &stmt, &IdentityMapper, &NoParameters).unwrap().unwrap();
        assert_eq!(merged, vec![Value::Int(4), Value::Int(3), Value::Int(1)]);
    }

    #[test]
    fn test_window_bounds() {
        assert_eq!(
            Window::new(Some(-3), Some(-1)),
            Window {
                offset: 0,
                count: None
            }
        );
        assert_eq!(Window::new(None, Some(2)).apply(1..10), vec![1, 2]);
        assert_eq!(Window::new(Some(8), None).apply(1..10), vec![9]);
    }
}
