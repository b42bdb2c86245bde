#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};

use shardline::{
    Configuration, ParsedSql, Parameters, Row, ShardExecutor, ShardStatement, ShardingPipeline,
    StatementCache,
};

/// Pipeline routing each `(table, strategy)` pair.
pub fn pipeline(routes: &[(&str, &str)]) -> ShardingPipeline {
    let mut builder = Configuration::builder();
    for (table, strategy) in routes {
        builder = builder.route(*table, *strategy);
    }
    let config = builder
        .build()
        .unwrap_or_else(|e| panic!("Invalid test configuration {routes:?}: {e}"));
    ShardingPipeline::new(config)
}

pub fn prepare(sql: &str) -> ParsedSql {
    StatementCache::new(8)
        .prepare(sql)
        .unwrap_or_else(|e| panic!("Failed to prepare: {sql}\nError: {e:?}"))
}

/// Suffixes the pipeline picks for `table`.
pub fn suffixes(pipeline: &ShardingPipeline, table: &str, sql: &str, params: &Parameters) -> BTreeSet<String> {
    let parsed = pipeline
        .prepare(sql)
        .unwrap_or_else(|e| panic!("Failed to prepare: {sql}\nError: {e:?}"));
    pipeline
        .rewriter()
        .routers()
        .get(table)
        .unwrap_or_else(|| panic!("No router for {table}"))
        .sub_table_names(&parsed, params)
        .unwrap_or_else(|e| panic!("Routing failed for: {sql}\nError: {e:?}"))
}

/// Every rewritten statement's text.
pub fn rewritten(pipeline: &ShardingPipeline, sql: &str, params: &Parameters) -> Vec<String> {
    let parsed = pipeline
        .prepare(sql)
        .unwrap_or_else(|e| panic!("Failed to prepare: {sql}\nError: {e:?}"));
    pipeline
        .rewrite(&parsed, params)
        .unwrap_or_else(|e| panic!("Rewrite failed for: {sql}\nError: {e:?}"))
        .map(|s| s.sql)
        .collect()
}

pub fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[derive(Debug, thiserror::Error)]
#[error("shard table {0} is unavailable")]
pub struct Unavailable(pub String);

/// In-memory executor: rows per physical table, and a log of every
/// statement it ran.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    pub tables: HashMap<String, Vec<Row>>,
    pub executed: Vec<String>,
    pub down: Option<String>,
}

impl MemoryExecutor {
    pub fn with_table(mut self, physical: &str, rows: Vec<Row>) -> Self {
        self.tables.insert(physical.to_string(), rows);
        self
    }

    fn target(&self, statement: &ShardStatement) -> Result<String, Unavailable> {
        let physical = statement
            .tables
            .first()
            .map_or_else(String::new, |(_, physical)| physical.clone());
        if self.down.as_deref() == Some(physical.as_str()) {
            return Err(Unavailable(physical));
        }
        Ok(physical)
    }
}

impl ShardExecutor for MemoryExecutor {
    type Row = Row;
    type Error = Unavailable;

    fn query(&mut self, statement: &ShardStatement, _params: &Parameters) -> Result<Vec<Row>, Unavailable> {
        let physical = self.target(statement)?;
        self.executed.push(statement.sql.clone());
        Ok(self.tables.get(&physical).cloned().unwrap_or_default())
    }

    fn update(&mut self, statement: &ShardStatement, _params: &Parameters) -> Result<u64, Unavailable> {
        self.target(statement)?;
        self.executed.push(statement.sql.clone());
        Ok(1)
    }
}
