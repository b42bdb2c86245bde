//! Parsed statement cache with single-flight parsing.
//!
//! Entries are keyed by statement text (after the head comment is split
//! off). Concurrent requests for the same text wait for one parse and share
//! its result. Failed parses are not cached, so a retry parses again.

use std::collections::BTreeSet;
use std::sync::Arc;

use moka::sync::Cache;
use shardline_sql::ast::Statement;
use shardline_sql::{ParseError, Parser};
use tracing::{debug, warn};

use crate::error::{Result, ShardError};
use crate::head_comment::HeadComment;

/// Default number of cached statements.
pub const DEFAULT_CACHE_CAPACITY: u64 = 389;

/// Environment variable overriding the configured cache capacity.
pub const CACHE_SIZE_ENV: &str = "SHARDLINE_PARSER_CACHE_SIZE";

/// A parsed statement and the logical tables it references.
///
/// The table set is computed once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    statement: Statement,
    table_names: BTreeSet<String>,
}

impl ParsedStatement {
    #[must_use]
    pub fn new(statement: Statement) -> Self {
        let table_names = statement.table_names();
        Self {
            statement,
            table_names,
        }
    }

    #[must_use]
    pub const fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Lower-cased logical table names, at any depth.
    #[must_use]
    pub const fn table_names(&self) -> &BTreeSet<String> {
        &self.table_names
    }
}

/// One statement execution: the statement text, its head comment and the
/// shared parse.
#[derive(Debug, Clone)]
pub struct ParsedSql {
    sql: String,
    head: HeadComment,
    parsed: Arc<ParsedStatement>,
}

impl ParsedSql {
    #[must_use]
    pub fn new(sql: impl Into<String>, head: HeadComment, parsed: Arc<ParsedStatement>) -> Self {
        Self {
            sql: sql.into(),
            head,
            parsed,
        }
    }

    /// Statement text without the head comment.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub const fn head_comment(&self) -> &HeadComment {
        &self.head
    }

    #[must_use]
    pub fn statement(&self) -> &Statement {
        self.parsed.statement()
    }

    #[must_use]
    pub fn table_names(&self) -> &BTreeSet<String> {
        self.parsed.table_names()
    }

    #[must_use]
    pub fn parsed(&self) -> &Arc<ParsedStatement> {
        &self.parsed
    }
}

/// Bounded statement cache.
#[derive(Clone)]
pub struct StatementCache {
    entries: Cache<String, Arc<ParsedStatement>>,
    capacity: u64,
}

impl std::fmt::Debug for StatementCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl Default for StatementCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl StatementCache {
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
            capacity,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Splits the head comment off `sql` and parses the rest.
    ///
    /// # Errors
    ///
    /// See [`StatementCache::get_or_parse`].
    pub fn prepare(&self, sql: &str) -> Result<ParsedSql> {
        let (head, body) = HeadComment::split(sql);
        let parsed = self.get_or_parse(body)?;
        Ok(ParsedSql::new(body, head, parsed))
    }

    /// Returns the cached parse of `sql`, parsing it on first use.
    ///
    /// # Errors
    ///
    /// [`ShardError::Parse`] for malformed SQL and
    /// [`ShardError::UnsupportedStatementKind`] for non-DML statements.
    pub fn get_or_parse(&self, sql: &str) -> Result<Arc<ParsedStatement>> {
        self.get_or_parse_with(sql, |sql| Parser::new(sql).parse_statement())
    }

    /// Like [`get_or_parse`](Self::get_or_parse) with a caller-supplied
    /// parse function. Only one caller per text runs `parse`; the others
    /// block until it finishes.
    ///
    /// # Errors
    ///
    /// Whatever `parse` fails with, converted into a [`ShardError`].
    pub fn get_or_parse_with<F>(&self, sql: &str, parse: F) -> Result<Arc<ParsedStatement>>
    where
        F: FnOnce(&str) -> std::result::Result<Statement, ParseError>,
    {
        if let Some(hit) = self.entries.get(sql) {
            debug!(sql, "statement cache hit");
            return Ok(hit);
        }
        self.entries
            .try_get_with(sql.to_string(), || {
                debug!(sql, "statement cache miss, parsing");
                parse(sql).map(|statement| Arc::new(ParsedStatement::new(statement)))
            })
            .map_err(|err: Arc<ParseError>| {
                warn!(sql, error = %err, "statement rejected");
                ShardError::from(ParseError::clone(&err))
            })
    }

    #[must_use]
    pub fn contains(&self, sql: &str) -> bool {
        self.entries.contains_key(sql)
    }

    /// Number of cached statements, after pending evictions are applied.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

/// Resolves the cache capacity from an environment override, falling back
/// to `configured` when the override is absent or not a number.
#[must_use]
pub fn capacity_override(raw: Option<&str>, configured: u64) -> u64 {
    match raw.map(str::trim) {
        None | Some("") => configured,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(value = raw, "ignoring invalid {CACHE_SIZE_ENV}");
            configured
        }),
    }
}
