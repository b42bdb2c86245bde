//! shardline CLI
//!
//! Loads a routing configuration and shows how statements are routed and
//! rewritten, without touching a database.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use shardline::{
    expand_list_parameters, Configuration, Parameters, ShardStatement, ShardingPipeline,
    StrategyRegistry, TableShards, Value,
};

/// Explain how shardline routes and rewrites SQL statements.
#[derive(Parser)]
#[command(name = "shardline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Routing configuration file (TOML).
    #[arg(short, long, env = "SHARDLINE_CONFIG", default_value = "shards.toml")]
    config: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the shards a statement visits and the rewritten statements.
    Explain {
        /// The SQL statement, head comment included.
        #[arg(short, long)]
        sql: String,

        /// Positional parameter, in `?` order. `[a, b]` binds a list.
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Named parameter as `name=value`.
        #[arg(short, long = "named", value_parser = parse_named)]
        named: Vec<(String, String)>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and list its routes.
    Check,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Configuration::from_path(&cli.config, &StrategyRegistry::default())?;

    match cli.command {
        Commands::Check => {
            println!("cache capacity: {}", config.cache_capacity());
            println!("mandatory:      {}", config.mandatory());
            println!("{:-<60}", "");
            for route in config.routes() {
                println!(" {:<24} {}", route.table, route.strategy);
            }
            info!(routes = config.routes().len(), "configuration is valid");
        }

        Commands::Explain {
            sql,
            params,
            named,
            json,
        } => {
            let mut bound = Parameters::positional(
                params.iter().map(String::as_str).map(parse_value).collect(),
            );
            for (name, value) in &named {
                bound = bound.bind_named(name.as_str(), parse_value(value));
            }
            let (sql, flat) = expand_list_parameters(&sql, bound.positional_values())?;
            let bound = bound.with_positional(flat);

            let pipeline = ShardingPipeline::new(config);
            let parsed = pipeline.prepare(&sql)?;
            let explanation = Explanation {
                tables: pipeline.rewriter().plan(&parsed, &bound)?,
                statements: pipeline.rewrite(&parsed, &bound)?.collect(),
            };
            info!(statements = explanation.statements.len(), "rewrote statement");

            if json {
                println!("{}", serde_json::to_string_pretty(&explanation)?);
            } else {
                explanation.print();
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct Explanation {
    tables: Vec<TableShards>,
    statements: Vec<ShardStatement>,
}

impl Explanation {
    fn print(&self) {
        println!("\nTables:");
        println!("{:-<60}", "");
        for table in &self.tables {
            if table.suffixes.is_empty() {
                println!(" {:<24} (unchanged)", table.table);
            } else {
                println!(" {:<24} {}", table.table, table.suffixes.join(", "));
            }
        }
        println!("\nStatements:");
        println!("{:-<60}", "");
        for statement in &self.statements {
            println!(" [{}] {}", statement.index, statement.sql);
        }
        println!();
    }
}

fn parse_named(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected `name=value`, got `{raw}`")),
    }
}

/// Reads a parameter typed on the command line: integers, decimals,
/// `yyyy-MM-dd` dates, booleans, `null` and `[a, b]` lists; anything else
/// is text.
fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    if let Some(items) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        if items.trim().is_empty() {
            return Value::List(vec![]);
        }
        return Value::List(items.split(',').map(parse_value).collect());
    }
    if raw.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::BigInt(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Double(f);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Value::Date(date);
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Text(raw.to_string()),
    }
}
