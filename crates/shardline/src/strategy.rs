//! Sharding strategies: how a column value maps to shard suffixes.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, LazyLock};

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::{Result, ShardError};
use crate::value::Value;

/// Maps values of one sharding column to shard suffixes.
pub trait ShardStrategy: Send + Sync + fmt::Debug {
    /// The sharding column, as written in the configuration.
    fn column(&self) -> &str;

    /// Every suffix the table may have. Empty when the shard space is
    /// unbounded.
    fn all_suffixes(&self) -> BTreeSet<String>;

    /// Suffixes holding rows whose sharding column equals `value`. NULL
    /// matches no row and yields an empty set.
    ///
    /// # Errors
    ///
    /// [`ShardError::InvalidShardValue`] when the value cannot be mapped.
    fn suffixes_for(&self, value: &Value) -> Result<BTreeSet<String>>;
}

/// `mod(column, n)`: suffix is the non-negative remainder of the value.
#[derive(Debug, Clone)]
pub struct ModStrategy {
    column: String,
    modulus: i64,
}

impl ModStrategy {
    /// # Errors
    ///
    /// [`ShardError::Configuration`] when `modulus` is not positive.
    pub fn new(column: impl Into<String>, modulus: i64) -> Result<Self> {
        if modulus <= 0 {
            return Err(ShardError::Configuration(format!(
                "mod strategy needs a positive modulus, got {modulus}"
            )));
        }
        Ok(Self {
            column: column.into(),
            modulus,
        })
    }

    fn describe(&self) -> String {
        format!("mod({}, {})", self.column, self.modulus)
    }

    fn integer(&self, value: &Value) -> Result<i64> {
        let parsed = match value {
            Value::Text(text) => text.trim().parse::<i64>().ok().or_else(|| {
                text.trim()
                    .parse::<BigDecimal>()
                    .ok()
                    .filter(BigDecimal::is_integer)
                    .and_then(|d| d.to_i64())
            }),
            other => other.as_i64(),
        };
        parsed.ok_or_else(|| ShardError::invalid_value(&self.describe(), value))
    }
}

impl ShardStrategy for ModStrategy {
    fn column(&self) -> &str {
        &self.column
    }

    fn all_suffixes(&self) -> BTreeSet<String> {
        (0..self.modulus).map(|n| n.to_string()).collect()
    }

    fn suffixes_for(&self, value: &Value) -> Result<BTreeSet<String>> {
        if value.is_null() {
            return Ok(BTreeSet::new());
        }
        let n = self.integer(value)?;
        Ok(BTreeSet::from([n.rem_euclid(self.modulus).to_string()]))
    }
}

/// `month(column)`: suffix is the month number, 1 to 12.
#[derive(Debug, Clone)]
pub struct MonthStrategy {
    column: String,
}

impl MonthStrategy {
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    fn month(&self, value: &Value) -> Result<u32> {
        let month = match value {
            Value::Date(date) => Some(date.month()),
            Value::DateTime(dt) => Some(dt.month()),
            // `yyyy-MM-dd`, optionally followed by a time part.
            Value::Text(text) => text
                .trim()
                .split([' ', 'T'])
                .next()
                .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
                .map(|date| date.month()),
            _ => None,
        };
        month.ok_or_else(|| ShardError::invalid_value(&format!("month({})", self.column), value))
    }
}

impl ShardStrategy for MonthStrategy {
    fn column(&self) -> &str {
        &self.column
    }

    fn all_suffixes(&self) -> BTreeSet<String> {
        (1..=12).map(|m: u32| m.to_string()).collect()
    }

    fn suffixes_for(&self, value: &Value) -> Result<BTreeSet<String>> {
        if value.is_null() {
            return Ok(BTreeSet::new());
        }
        Ok(BTreeSet::from([self.month(value)?.to_string()]))
    }
}

/// `val(column)`: suffix is the value itself.
#[derive(Debug, Clone)]
pub struct ValueStrategy {
    column: String,
}

impl ValueStrategy {
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl ShardStrategy for ValueStrategy {
    fn column(&self) -> &str {
        &self.column
    }

    fn all_suffixes(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn suffixes_for(&self, value: &Value) -> Result<BTreeSet<String>> {
        match value {
            Value::Null => Ok(BTreeSet::new()),
            Value::List(_) | Value::Bytes(_) => Err(ShardError::invalid_value(
                &format!("val({})", self.column),
                value,
            )),
            other => Ok(BTreeSet::from([other.to_string()])),
        }
    }
}

/// Builds a strategy from the arguments of its call form.
pub type StrategyFactory = Arc<dyn Fn(&[String]) -> Result<Arc<dyn ShardStrategy>> + Send + Sync>;

static STRATEGY_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.$]*)\s*(?:\(([^()]*)\))?\s*$")
        .expect("strategy syntax regex is valid")
});

/// Named strategy factories.
///
/// `mod`, `month` and `val` are registered by default. Hosts register
/// their own strategies under any other name, call form or bare.
#[derive(Clone)]
pub struct StrategyRegistry {
    factories: HashMap<String, StrategyFactory>,
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("StrategyRegistry")
            .field("strategies", &names)
            .finish()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("mod", |args| {
            let [column, modulus] = args else {
                return Err(arity("mod", "mod(column, n)", args));
            };
            let modulus = modulus.parse::<i64>().map_err(|_| {
                ShardError::Configuration(format!("mod modulus `{modulus}` is not an integer"))
            })?;
            Ok(Arc::new(ModStrategy::new(column.clone(), modulus)?))
        });
        registry.register("month", |args| match args {
            [column] => Ok(Arc::new(MonthStrategy::new(column.clone()))),
            _ => Err(arity("month", "month(column)", args)),
        });
        registry.register("val", |args| match args {
            [column] => Ok(Arc::new(ValueStrategy::new(column.clone()))),
            _ => Err(arity("val", "val(column)", args)),
        });
        registry
    }
}

fn arity(name: &str, usage: &str, args: &[String]) -> ShardError {
    ShardError::Configuration(format!(
        "{name} strategy takes `{usage}`, got {} argument(s)",
        args.len()
    ))
}

impl StrategyRegistry {
    /// A registry without the built-in strategies.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers (or replaces) a strategy factory. Names are matched
    /// case-insensitively.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&[String]) -> Result<Arc<dyn ShardStrategy>> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.to_ascii_lowercase(), Arc::new(factory));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    /// Builds a strategy from `name(arg, ...)` or a bare `name`.
    ///
    /// # Errors
    ///
    /// [`ShardError::Configuration`] for malformed syntax, unknown names
    /// and arguments the factory rejects.
    pub fn build(&self, spec: &str) -> Result<Arc<dyn ShardStrategy>> {
        let captures = STRATEGY_SYNTAX.captures(spec).ok_or_else(|| {
            ShardError::Configuration(format!("malformed strategy `{spec}`"))
        })?;
        let name = captures.get(1).map_or("", |m| m.as_str());
        let args: Vec<String> = match captures.get(2) {
            None => vec![],
            Some(m) if m.as_str().trim().is_empty() => vec![],
            Some(m) => m.as_str().split(',').map(|a| a.trim().to_string()).collect(),
        };
        if args.iter().any(String::is_empty) {
            return Err(ShardError::Configuration(format!(
                "empty argument in strategy `{spec}`"
            )));
        }
        let factory = self
            .factories
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| ShardError::Configuration(format!("unknown strategy `{name}`")))?;
        factory(&args)
    }
}
