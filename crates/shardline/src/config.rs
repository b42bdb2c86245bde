//! Routing configuration loaded from TOML or built in code.
//!
//! ```toml
//! [parser]
//! cache_capacity = 389
//!
//! [sharding]
//! mandatory = false
//!
//! [[route]]
//! table = "orders"
//! strategy = "mod(user_id, 8)"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{capacity_override, CACHE_SIZE_ENV, DEFAULT_CACHE_CAPACITY};
use crate::error::{Result, ShardError};
use crate::router::{Router, RouterTable};
use crate::strategy::StrategyRegistry;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    parser: ParserSection,
    #[serde(default)]
    sharding: ShardingSection,
    #[serde(default, rename = "route")]
    routes: Vec<RouteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ParserSection {
    #[serde(default = "default_cache_capacity")]
    cache_capacity: u64,
}

impl Default for ParserSection {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

const fn default_cache_capacity() -> u64 {
    DEFAULT_CACHE_CAPACITY
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ShardingSection {
    #[serde(default)]
    mandatory: bool,
}

/// One `table → strategy` entry as written in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub table: String,
    pub strategy: String,
}

/// Validated configuration with its routers built.
#[derive(Debug, Clone)]
pub struct Configuration {
    cache_capacity: u64,
    mandatory: bool,
    routes: Vec<RouteConfig>,
    routers: RouterTable,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            mandatory: false,
            routes: Vec::new(),
            routers: RouterTable::new(),
        }
    }
}

impl Configuration {
    #[must_use]
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Parses a TOML document, building strategies through `registry`.
    ///
    /// # Errors
    ///
    /// [`ShardError::Configuration`] for malformed TOML, unknown keys,
    /// malformed or unknown strategies and duplicate tables.
    pub fn from_toml_str(text: &str, registry: &StrategyRegistry) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| ShardError::Configuration(e.to_string()))?;
        let mut builder = Self::builder()
            .cache_capacity(file.parser.cache_capacity)
            .mandatory(file.sharding.mandatory)
            .registry(registry.clone());
        for route in file.routes {
            builder = builder.route(route.table, route.strategy);
        }
        builder.build()
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`ShardError::Io`] when the file cannot be read, otherwise as
    /// [`Configuration::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>, registry: &StrategyRegistry) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text, registry)?;
        info!(path = %path.display(), routes = config.routes.len(), "loaded routing configuration");
        Ok(config)
    }

    /// Statement cache capacity, after the environment override.
    #[must_use]
    pub const fn cache_capacity(&self) -> u64 {
        self.cache_capacity
    }

    /// Whether inserts must resolve to a shard.
    #[must_use]
    pub const fn mandatory(&self) -> bool {
        self.mandatory
    }

    #[must_use]
    pub fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }

    #[must_use]
    pub const fn routers(&self) -> &RouterTable {
        &self.routers
    }
}

/// Programmatic construction of a [`Configuration`].
#[derive(Debug, Clone)]
pub struct ConfigurationBuilder {
    cache_capacity: u64,
    mandatory: bool,
    routes: Vec<RouteConfig>,
    registry: StrategyRegistry,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            mandatory: false,
            routes: Vec::new(),
            registry: StrategyRegistry::default(),
        }
    }
}

impl ConfigurationBuilder {
    #[must_use]
    pub const fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    /// Routes `table` with a strategy such as `mod(user_id, 8)`.
    #[must_use]
    pub fn route(mut self, table: impl Into<String>, strategy: impl Into<String>) -> Self {
        self.routes.push(RouteConfig {
            table: table.into(),
            strategy: strategy.into(),
        });
        self
    }

    /// Replaces the strategy registry, e.g. to add custom strategies.
    #[must_use]
    pub fn registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Builds every router. The cache capacity can be overridden through
    /// the `SHARDLINE_PARSER_CACHE_SIZE` environment variable.
    ///
    /// # Errors
    ///
    /// [`ShardError::Configuration`] for an empty or duplicate table name
    /// and for strategies the registry cannot build.
    pub fn build(self) -> Result<Configuration> {
        let mut routers = RouterTable::new();
        for route in &self.routes {
            let table = route.table.trim();
            if table.is_empty() {
                return Err(ShardError::Configuration("route without a table name".into()));
            }
            let strategy = self.registry.build(&route.strategy).map_err(|e| match e {
                ShardError::Configuration(msg) => {
                    ShardError::Configuration(format!("table `{table}`: {msg}"))
                }
                other => other,
            })?;
            if routers.insert(Router::new(table, strategy)).is_some() {
                return Err(ShardError::Configuration(format!(
                    "table `{table}` is routed more than once"
                )));
            }
        }
        let env = std::env::var(CACHE_SIZE_ENV).ok();
        Ok(Configuration {
            cache_capacity: capacity_override(env.as_deref(), self.cache_capacity),
            mandatory: self.mandatory,
            routes: self.routes,
            routers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_document() {
        let config = Configuration::from_toml_str("", &StrategyRegistry::default()).unwrap();
        assert!(!config.mandatory());
        assert!(config.routers().is_empty());
        assert!(config.routes().is_empty());
    }

    #[test]
    fn test_routes_are_built() {
        let text = r#"
            [sharding]
            mandatory = true

            [[route]]
            table = "Orders"
            strategy = "mod(user_id, 4)"

            [[route]]
            table = "events"
            strategy = "month(created)"
        "#;
        let config = Configuration::from_toml_str(text, &StrategyRegistry::default()).unwrap();
        assert!(config.mandatory());
        assert_eq!(config.routers().len(), 2);
        let orders = config.routers().get("orders").unwrap();
        assert_eq!(orders.strategy().column(), "user_id");
        assert_eq!(orders.strategy().all_suffixes().len(), 4);
        assert_eq!(config.routes()[1].strategy, "month(created)");
    }

    #[test]
    fn test_invalid_documents() {
        let registry = StrategyRegistry::default();
        let cases = [
            "[parser]\ncache_capacity = \"big\"",
            "[unknown]\nkey = 1",
            "[[route]]\ntable = \"t\"\nstrategy = \"mod(a, 0)\"",
            "[[route]]\ntable = \"t\"\nstrategy = \"hash(a)\"",
            "[[route]]\ntable = \"\"\nstrategy = \"val(a)\"",
            "[[route]]\ntable = \"t\"\nstrategy = \"val(a)\"\n[[route]]\ntable = \"T\"\nstrategy = \"val(b)\"",
        ];
        for text in cases {
            let err = Configuration::from_toml_str(text, &registry).unwrap_err();
            assert!(matches!(err, ShardError::Configuration(_)), "{text}: {err}");
        }
    }

    #[test]
    fn test_builder() {
        let config = Configuration::builder()
            .mandatory(true)
            .route("users", "val(region)")
            .build()
            .unwrap();
        assert!(config.mandatory());
        assert!(config.routers().get("USERS").is_some());
    }
}
