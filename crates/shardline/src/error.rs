//! Error types for routing, rewriting and merging.

use shardline_sql::{ParseError, ParseErrorKind};
use thiserror::Error;

/// Errors raised by the sharding pipeline.
#[derive(Debug, Error)]
pub enum ShardError {
    /// The SQL text could not be parsed.
    #[error("malformed SQL: {0}")]
    Parse(ParseError),

    /// DDL, transaction control or another statement kind that is not
    /// SELECT / INSERT / UPDATE / DELETE.
    #[error("unsupported statement kind: {0}")]
    UnsupportedStatementKind(String),

    /// AVG, or a SUM over a type without an adder.
    #[error("unsupported aggregate: {0}")]
    UnsupportedAggregate(String),

    /// The per-shard results cannot be recombined, e.g. `SELECT *` with
    /// `ORDER BY`.
    #[error("unmergeable result shape: {0}")]
    UnmergeableResultShape(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// An insert could not be routed while sharding is mandatory.
    #[error("no shard for insert into `{0}`")]
    MissingRouteTarget(String),

    /// A strategy cannot map a concrete value to a shard.
    #[error("invalid shard value for {strategy}: {value}")]
    InvalidShardValue { strategy: String, value: String },

    /// An insert would have to be split across shards.
    #[error("insert into `{table}` spans {shards} shards")]
    CrossShardInsert { table: String, shards: usize },

    #[error("{0} overflowed while merging shard results")]
    AggregateOverflow(String),

    /// Error reported by the host executor for one shard statement.
    #[error("shard execution failed: {0}")]
    Execution(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ParseError> for ShardError {
    fn from(err: ParseError) -> Self {
        match err.kind {
            ParseErrorKind::UnsupportedStatement => Self::UnsupportedStatementKind(err.message),
            ParseErrorKind::Syntax => Self::Parse(err),
        }
    }
}

impl ShardError {
    pub(crate) fn invalid_value(strategy: &str, value: impl std::fmt::Display) -> Self {
        Self::InvalidShardValue {
            strategy: strategy.to_string(),
            value: value.to_string(),
        }
    }
}

/// Result type alias for sharding operations.
pub type Result<T> = std::result::Result<T, ShardError>;
