//! The statement pipeline: parse, route, rewrite, execute and merge.

use tracing::{debug, info};

use crate::cache::{ParsedSql, StatementCache};
use crate::config::Configuration;
use crate::error::{Result, ShardError};
use crate::expand::expand_list_parameters;
use crate::merger::{merge, MergedRows};
use crate::params::{ParameterSupplier, Parameters};
use crate::rewriter::{Rewriter, Rewrites, ShardStatement};
use crate::row::{ColumnMapper, ResultRow};

/// Runs physical statements on behalf of the pipeline.
///
/// Each call receives its own statement value; nothing is shared between
/// calls, so an implementation may dispatch them concurrently.
pub trait ShardExecutor {
    type Row: ResultRow;
    type Error: std::error::Error + Send + Sync + 'static;

    fn query(
        &mut self,
        statement: &ShardStatement,
        params: &Parameters,
    ) -> std::result::Result<Vec<Self::Row>, Self::Error>;

    /// Returns the number of affected rows.
    fn update(
        &mut self,
        statement: &ShardStatement,
        params: &Parameters,
    ) -> std::result::Result<u64, Self::Error>;
}

/// Owns the statement cache and routers for one configuration.
#[derive(Debug, Clone)]
pub struct ShardingPipeline {
    cache: StatementCache,
    rewriter: Rewriter,
}

impl ShardingPipeline {
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        info!(
            cache_capacity = config.cache_capacity(),
            routes = config.routers().len(),
            mandatory = config.mandatory(),
            "sharding pipeline ready"
        );
        Self {
            cache: StatementCache::new(config.cache_capacity()),
            rewriter: Rewriter::new(config.routers().clone(), config.mandatory()),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &StatementCache {
        &self.cache
    }

    #[must_use]
    pub const fn rewriter(&self) -> &Rewriter {
        &self.rewriter
    }

    /// Splits off the head comment and parses, through the cache.
    ///
    /// # Errors
    ///
    /// [`ShardError::Parse`] or [`ShardError::UnsupportedStatementKind`].
    pub fn prepare(&self, sql: &str) -> Result<ParsedSql> {
        self.cache.prepare(sql)
    }

    /// Lazily produces the physical statements for `parsed`.
    ///
    /// # Errors
    ///
    /// Routing errors; see [`Rewriter::plan`].
    pub fn rewrite(&self, parsed: &ParsedSql, params: &dyn ParameterSupplier) -> Result<Rewrites> {
        self.rewriter.rewrite(parsed, params)
    }

    /// Runs a query on every shard it routes to and merges the results.
    ///
    /// # Errors
    ///
    /// Parse, routing and merge errors, and [`ShardError::Execution`]
    /// when the executor fails on any shard.
    pub fn query<E: ShardExecutor>(
        &self,
        executor: &mut E,
        sql: &str,
        params: &Parameters,
        mapper: &dyn ColumnMapper,
    ) -> Result<Option<MergedRows<E::Row>>> {
        let (sql, params) = expand(sql, params)?;
        let parsed = self.prepare(&sql)?;
        let rewrites = self.rewrite(&parsed, &params)?;
        let mut results = Vec::with_capacity(rewrites.len());
        for statement in rewrites {
            debug!(index = statement.index, sql = %statement.sql, "dispatching query");
            let rows = executor
                .query(&statement, &params)
                .map_err(|e| ShardError::Execution(Box::new(e)))?;
            results.push(rows);
        }
        merge(results, parsed.statement(), mapper, &params)
    }

    /// Runs a write on every shard it routes to and sums the affected
    /// row counts.
    ///
    /// # Errors
    ///
    /// Parse and routing errors, [`ShardError::Execution`] when the
    /// executor fails and [`ShardError::AggregateOverflow`].
    pub fn update<E: ShardExecutor>(
        &self,
        executor: &mut E,
        sql: &str,
        params: &Parameters,
    ) -> Result<u64> {
        let (sql, params) = expand(sql, params)?;
        let parsed = self.prepare(&sql)?;
        let mut total: u64 = 0;
        for statement in self.rewrite(&parsed, &params)? {
            debug!(index = statement.index, sql = %statement.sql, "dispatching update");
            let affected = executor
                .update(&statement, &params)
                .map_err(|e| ShardError::Execution(Box::new(e)))?;
            total = total
                .checked_add(affected)
                .ok_or_else(|| ShardError::AggregateOverflow("affected row count".into()))?;
        }
        Ok(total)
    }
}

fn expand(sql: &str, params: &Parameters) -> Result<(String, Parameters)> {
    let (sql, flat) = expand_list_parameters(sql, params.positional_values())?;
    Ok((sql, params.with_positional(flat)))
}
