//! # shardline
//!
//! Transparent table sharding for SQL statements. A statement written
//! against logical tables is parsed once (through a bounded cache), routed
//! per table to the shards its predicates pin down, rewritten into one
//! physical statement per shard combination, and the per-shard results are
//! merged back into one logical result.
//!
//! This crate provides:
//! - [`StatementCache`] for single-flight cached parsing
//! - [`Router`] and the built-in `mod`, `month` and `val` strategies
//! - [`Rewriter`] producing [`ShardStatement`]s lazily
//! - [`merge`] re-applying aggregates, `ORDER BY` and `LIMIT`
//! - [`ShardingPipeline`] tying them together around a host [`ShardExecutor`]
//!
//! ## Quick Start
//!
//! ```rust
//! use shardline::{Configuration, Parameters, ShardingPipeline};
//!
//! let config = Configuration::builder()
//!     .route("orders", "mod(user_id, 4)")
//!     .build()?;
//! let pipeline = ShardingPipeline::new(config);
//!
//! let parsed = pipeline.prepare("SELECT * FROM orders WHERE user_id = ?")?;
//! let params = Parameters::new().bind(6);
//! let sql: Vec<String> = pipeline.rewrite(&parsed, &params)?.map(|s| s.sql).collect();
//! assert_eq!(sql, vec!["SELECT * FROM orders_2 WHERE user_id = ?"]);
//! # Ok::<(), shardline::ShardError>(())
//! ```
//!
//! Statements that cannot be pinned to particular shards go to every
//! shard of the table.

pub mod cache;
pub mod config;
pub mod error;
mod expand;
pub mod head_comment;
mod lexical;
pub mod merger;
pub mod params;
pub mod pipeline;
pub mod rewriter;
pub mod router;
pub mod row;
pub mod strategy;
pub mod value;

pub use cache::{ParsedSql, ParsedStatement, StatementCache, DEFAULT_CACHE_CAPACITY};
pub use config::{Configuration, ConfigurationBuilder, RouteConfig};
pub use error::{Result, ShardError};
pub use expand::expand_list_parameters;
pub use head_comment::HeadComment;
pub use merger::{merge, MergeStrategy, MergedRows};
pub use params::{NoParameters, ParameterSupplier, Parameters};
pub use pipeline::{ShardExecutor, ShardingPipeline};
pub use rewriter::{Rewriter, Rewrites, ShardStatement, TableShards};
pub use router::{Router, RouterTable};
pub use row::{CamelCaseMapper, ColumnMapper, IdentityMapper, ResultRow, Row};
pub use strategy::{
    ModStrategy, MonthStrategy, ShardStrategy, StrategyFactory, StrategyRegistry, ValueStrategy,
};
pub use value::Value;
