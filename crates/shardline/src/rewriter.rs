//! Turns one logical statement into one physical statement per shard
//! combination.
//!
//! Table names are substituted in the original text, so comments, hints
//! and formatting survive. Statements are produced lazily; nothing is
//! generated for combinations the caller never pulls.

use std::iter::FusedIterator;

use serde::Serialize;
use shardline_sql::ast::Statement;
use tracing::debug;

use crate::cache::ParsedSql;
use crate::error::{Result, ShardError};
use crate::lexical::replace_words;
use crate::params::ParameterSupplier;
use crate::router::RouterTable;

/// The shard suffixes chosen for one logical table. An empty list leaves
/// the table name unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableShards {
    pub table: String,
    pub suffixes: Vec<String>,
}

/// One physical statement, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardStatement {
    pub sql: String,
    /// Position in the rewrite sequence, starting at 0.
    pub index: usize,
    /// `(logical, physical)` names substituted into `sql`.
    pub tables: Vec<(String, String)>,
}

/// Physical name of a shard table.
#[must_use]
pub fn physical_name(table: &str, suffix: &str) -> String {
    format!("{table}_{suffix}")
}

/// Plans and produces rewrites using a table of routers.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    routers: RouterTable,
    mandatory: bool,
}

impl Rewriter {
    /// `mandatory` makes an INSERT that cannot be routed an error instead
    /// of a pass-through.
    #[must_use]
    pub const fn new(routers: RouterTable, mandatory: bool) -> Self {
        Self { routers, mandatory }
    }

    #[must_use]
    pub const fn routers(&self) -> &RouterTable {
        &self.routers
    }

    /// Routes every table the statement references.
    ///
    /// Tables without a router keep their name.
    ///
    /// # Errors
    ///
    /// Routing errors, [`ShardError::CrossShardInsert`] when the insert
    /// target resolves to several shards and
    /// [`ShardError::MissingRouteTarget`] when it resolves to none while
    /// sharding is mandatory.
    pub fn plan(
        &self,
        parsed: &ParsedSql,
        params: &dyn ParameterSupplier,
    ) -> Result<Vec<TableShards>> {
        let insert_target = match parsed.statement() {
            Statement::Insert(insert) => Some(insert.table.to_lowercase()),
            _ => None,
        };

        let mut plan = Vec::with_capacity(parsed.table_names().len());
        for table in parsed.table_names() {
            let suffixes: Vec<String> = match self.routers.get(table) {
                Some(router) => router.sub_table_names(parsed, params)?.into_iter().collect(),
                None => vec![],
            };
            if insert_target.as_deref() == Some(table.as_str()) {
                if suffixes.len() > 1 {
                    return Err(ShardError::CrossShardInsert {
                        table: table.clone(),
                        shards: suffixes.len(),
                    });
                }
                if suffixes.is_empty() && self.mandatory {
                    return Err(ShardError::MissingRouteTarget(table.clone()));
                }
            }
            plan.push(TableShards {
                table: table.clone(),
                suffixes,
            });
        }
        Ok(plan)
    }

    /// Lazily rewrites `parsed` once per combination of shard suffixes.
    ///
    /// # Errors
    ///
    /// See [`Rewriter::plan`].
    pub fn rewrite(&self, parsed: &ParsedSql, params: &dyn ParameterSupplier) -> Result<Rewrites> {
        let plan = self.plan(parsed, params)?;
        let rewrites = Rewrites::new(parsed.sql().to_string(), plan);
        debug!(statements = rewrites.len(), "planned shard rewrites");
        Ok(rewrites)
    }
}

/// Single-pass sequence of rewritten statements, one per element of the
/// cartesian product of the tables' suffix lists.
#[derive(Debug, Clone)]
pub struct Rewrites {
    sql: String,
    dimensions: Vec<TableShards>,
    odometer: Vec<usize>,
    next_index: usize,
    total: usize,
}

impl Rewrites {
    #[must_use]
    pub fn new(sql: String, plan: Vec<TableShards>) -> Self {
        let dimensions: Vec<_> = plan.into_iter().filter(|t| !t.suffixes.is_empty()).collect();
        let total = dimensions
            .iter()
            .fold(1_usize, |acc, t| acc.saturating_mul(t.suffixes.len()));
        Self {
            odometer: vec![0; dimensions.len()],
            sql,
            dimensions,
            next_index: 0,
            total,
        }
    }

    /// Statement text before substitution.
    #[must_use]
    pub fn original_sql(&self) -> &str {
        &self.sql
    }

    fn advance(&mut self) {
        for (position, table) in self.odometer.iter_mut().zip(&self.dimensions).rev() {
            *position += 1;
            if *position < table.suffixes.len() {
                return;
            }
            *position = 0;
        }
    }
}

impl Iterator for Rewrites {
    type Item = ShardStatement;

    fn next(&mut self) -> Option<ShardStatement> {
        if self.next_index >= self.total {
            return None;
        }
        let tables: Vec<(String, String)> = self
            .dimensions
            .iter()
            .zip(&self.odometer)
            .map(|(t, &i)| (t.table.clone(), physical_name(&t.table, &t.suffixes[i])))
            .collect();
        let sql = if tables.is_empty() {
            self.sql.clone()
        } else {
            let pairs: Vec<(&str, &str)> = tables
                .iter()
                .map(|(logical, physical)| (logical.as_str(), physical.as_str()))
                .collect();
            replace_words(&self.sql, &pairs)
        };
        let statement = ShardStatement {
            sql,
            index: self.next_index,
            tables,
        };
        self.next_index += 1;
        self.advance();
        Some(statement)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Rewrites {}

impl FusedIterator for Rewrites {}
