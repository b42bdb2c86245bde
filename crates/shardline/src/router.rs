//! Per-table routing: which shard suffixes a statement has to visit.
//!
//! A [`Router`] owns one logical table and its [`ShardStrategy`]. Routing
//! never guesses: whenever the predicate does not pin the sharding column
//! down, the result is every suffix of the table.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use shardline_sql::ast::{
    BinaryOp, BoundTable, Expr, InsertSource, InsertStatement, SelectStatement, Statement,
};
use tracing::debug;

use crate::cache::ParsedSql;
use crate::error::Result;
use crate::head_comment::{HeadComment, resolve_value};
use crate::params::ParameterSupplier;
use crate::strategy::ShardStrategy;
use crate::value::Value;

/// Suffixes found for one statement, plus whether something forced a full
/// fan-out.
#[derive(Debug, Default)]
struct Routed {
    suffixes: BTreeSet<String>,
    fail_open: Option<&'static str>,
}

impl Routed {
    fn fail_open(reason: &'static str) -> Self {
        Self {
            suffixes: BTreeSet::new(),
            fail_open: Some(reason),
        }
    }

    fn absorb(&mut self, other: Self) {
        self.suffixes.extend(other.suffixes);
        if self.fail_open.is_none() {
            self.fail_open = other.fail_open;
        }
    }
}

/// Routes statements for one logical table.
#[derive(Debug, Clone)]
pub struct Router {
    table: String,
    strategy: Arc<dyn ShardStrategy>,
}

impl Router {
    /// Creates a router for `table`. The name is matched case-insensitively.
    #[must_use]
    pub fn new(table: impl Into<String>, strategy: Arc<dyn ShardStrategy>) -> Self {
        Self {
            table: table.into().to_lowercase(),
            strategy,
        }
    }

    /// Lower-cased logical table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn strategy(&self) -> &Arc<dyn ShardStrategy> {
        &self.strategy
    }

    /// Shard suffixes `parsed` must visit for this table.
    ///
    /// Head-comment overrides for the sharding column are applied first.
    /// When they yield nothing, a SELECT / UPDATE / DELETE without a usable
    /// predicate visits every suffix. An INSERT whose shard value cannot be
    /// read from its `VALUES` yields nothing; for an INSERT into another
    /// table only the subselects reading this table are routed.
    ///
    /// # Errors
    ///
    /// [`ShardError::InvalidShardValue`](crate::ShardError::InvalidShardValue)
    /// when the strategy rejects a value found in the statement.
    pub fn sub_table_names(
        &self,
        parsed: &ParsedSql,
        params: &dyn ParameterSupplier,
    ) -> Result<BTreeSet<String>> {
        let mut suffixes = self.overrides(parsed.head_comment(), params)?;
        let overridden = !suffixes.is_empty();

        let statement = parsed.statement();
        let mut routed = self.route_statement(statement, params)?;
        let is_insert = matches!(statement, Statement::Insert(_));
        if !overridden && !is_insert && routed.suffixes.is_empty() && routed.fail_open.is_none() {
            routed.fail_open = Some(match statement.where_clause() {
                None => "no WHERE clause",
                Some(_) => "predicate does not pin the sharding column",
            });
        }

        suffixes.extend(routed.suffixes);
        if let Some(reason) = routed.fail_open {
            suffixes.extend(self.strategy.all_suffixes());
            debug!(table = %self.table, reason, "routing to every shard");
        }
        debug!(
            table = %self.table,
            shards = suffixes.len(),
            overridden,
            "routed statement"
        );
        Ok(suffixes)
    }

    fn overrides(
        &self,
        head: &HeadComment,
        params: &dyn ParameterSupplier,
    ) -> Result<BTreeSet<String>> {
        let mut suffixes = BTreeSet::new();
        for reference in head.values_for(self.strategy.column()) {
            let value = resolve_value(reference, params);
            suffixes.extend(self.suffixes_for(&value)?);
        }
        Ok(suffixes)
    }

    fn suffixes_for(&self, value: &Value) -> Result<BTreeSet<String>> {
        match value {
            Value::List(items) => {
                let mut out = BTreeSet::new();
                for item in items {
                    out.extend(self.strategy.suffixes_for(item)?);
                }
                Ok(out)
            }
            other => self.strategy.suffixes_for(other),
        }
    }

    fn route_statement(
        &self,
        statement: &Statement,
        params: &dyn ParameterSupplier,
    ) -> Result<Routed> {
        match statement {
            Statement::Insert(insert) => self.route_insert(insert, params),
            _ => match statement.where_clause() {
                None => Ok(Routed::default()),
                Some(predicate) => {
                    let mut walk = Walk::new(self, statement.bound_tables(), params);
                    walk.visit(predicate)?;
                    Ok(walk.routed)
                }
            },
        }
    }

    /// Routes a subselect met inside a predicate. Only subselects that
    /// reference this table contribute.
    fn route_subselect(
        &self,
        query: &SelectStatement,
        params: &dyn ParameterSupplier,
    ) -> Result<Routed> {
        if !query.table_names().contains(&self.table) {
            return Ok(Routed::default());
        }
        match &query.where_clause {
            None if query.bound_tables().iter().any(|b| self.owns(b)) => {
                Ok(Routed::fail_open("subselect without WHERE clause"))
            }
            None => Ok(Routed::default()),
            Some(predicate) => {
                let mut walk = Walk::new(self, query.bound_tables(), params);
                walk.visit(predicate)?;
                Ok(walk.routed)
            }
        }
    }

    /// Every row of a `VALUES` list is routed; the i-th listed column pairs
    /// with the i-th value.
    fn route_insert(
        &self,
        insert: &InsertStatement,
        params: &dyn ParameterSupplier,
    ) -> Result<Routed> {
        if !insert.table.eq_ignore_ascii_case(&self.table) {
            return self.route_insert_sources(insert, params);
        }
        let InsertSource::Values(rows) = &insert.source else {
            return Ok(Routed::default());
        };
        let column = self.strategy.column();
        let Some(index) = insert
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
        else {
            return Ok(Routed::default());
        };

        let bound = vec![BoundTable {
            name: &insert.table,
            alias: None,
        }];
        let mut walk = Walk::new(self, bound, params);
        for row in rows {
            if let Some(value) = row.get(index) {
                walk.value(value)?;
            }
        }
        Ok(walk.routed)
    }

    /// Routes this table where it only appears in the subselects of an
    /// insert into another table. A subselect that reads the table without
    /// pinning the sharding column visits every suffix.
    fn route_insert_sources(
        &self,
        insert: &InsertStatement,
        params: &dyn ParameterSupplier,
    ) -> Result<Routed> {
        let mut queries: Vec<&SelectStatement> = Vec::new();
        match &insert.source {
            InsertSource::Query(query) => queries.push(query),
            InsertSource::Values(rows) => {
                for expr in rows.iter().flatten() {
                    expr.for_each_subquery(&mut |q| queries.push(q));
                }
            }
            InsertSource::DefaultValues => {}
        }
        for assignment in &insert.on_duplicate {
            assignment.value.for_each_subquery(&mut |q| queries.push(q));
        }

        let mut routed = Routed::default();
        for query in queries {
            if !query.table_names().contains(&self.table) {
                continue;
            }
            let nested = self.route_subselect(query, params)?;
            if nested.suffixes.is_empty() && nested.fail_open.is_none() {
                routed.absorb(Routed::fail_open("insert subselect does not pin the sharding column"));
            } else {
                routed.absorb(nested);
            }
        }
        Ok(routed)
    }

    fn owns(&self, bound: &BoundTable<'_>) -> bool {
        bound.name.eq_ignore_ascii_case(&self.table)
    }
}

/// Depth-first walk over a predicate, collecting suffixes for the
/// sharding column.
struct Walk<'a> {
    router: &'a Router,
    bound: Vec<BoundTable<'a>>,
    params: &'a dyn ParameterSupplier,
    routed: Routed,
}

impl<'a> Walk<'a> {
    fn new(
        router: &'a Router,
        bound: Vec<BoundTable<'a>>,
        params: &'a dyn ParameterSupplier,
    ) -> Self {
        Self {
            router,
            bound,
            params,
            routed: Routed::default(),
        }
    }

    fn visit(&mut self, expr: &Expr) -> Result<()> {
        match expr.unparenthesized() {
            Expr::Binary { left, op, right } if op.is_logical() => {
                self.visit(left)?;
                self.visit(right)
            }
            Expr::Binary {
                left,
                op: BinaryOp::Eq,
                right,
            } => {
                if self.is_shard_column(left) {
                    self.value(right)
                } else if self.is_shard_column(right) {
                    self.value(left)
                } else {
                    Ok(())
                }
            }
            Expr::In {
                expr,
                list,
                negated: false,
            } if self.is_shard_column(expr) => match list.as_slice() {
                [Expr::Subquery(_)] => {
                    self.fail_open("IN subselect on the sharding column");
                    Ok(())
                }
                items => items.iter().try_for_each(|item| self.value(item)),
            },
            _ => Ok(()),
        }
    }

    /// Adds the suffixes of the value a sharding column is compared to.
    fn value(&mut self, expr: &Expr) -> Result<()> {
        match expr.unparenthesized() {
            Expr::Literal(literal) => self.add(&Value::from_literal(literal)),
            Expr::Parameter(placeholder) => match self.params.placeholder(placeholder) {
                Some(value) => {
                    let value = value.clone();
                    self.add(&value)
                }
                None => {
                    self.fail_open("unbound parameter on the sharding column");
                    Ok(())
                }
            },
            Expr::Subquery(query) => {
                let nested = self.router.route_subselect(query, self.params)?;
                self.routed.absorb(nested);
                Ok(())
            }
            _ => {
                self.fail_open("sharding column compared to an expression");
                Ok(())
            }
        }
    }

    fn add(&mut self, value: &Value) -> Result<()> {
        let suffixes = self.router.suffixes_for(value)?;
        self.routed.suffixes.extend(suffixes);
        Ok(())
    }

    fn fail_open(&mut self, reason: &'static str) {
        self.routed.fail_open.get_or_insert(reason);
    }

    /// Whether `expr` is this router's sharding column on a table bound at
    /// this level. Unqualified columns count only when the table is bound.
    fn is_shard_column(&self, expr: &Expr) -> bool {
        let Expr::Column { table, name, .. } = expr.unparenthesized() else {
            return false;
        };
        if !name.eq_ignore_ascii_case(self.router.strategy.column()) {
            return false;
        }
        let mut own = self.bound.iter().filter(|b| self.router.owns(b));
        match table {
            Some(qualifier) => own.any(|b| b.answers_to(qualifier)),
            None => own.next().is_some(),
        }
    }
}

/// Routers keyed by lower-cased logical table name.
#[derive(Debug, Clone, Default)]
pub struct RouterTable {
    routers: HashMap<String, Router>,
}

impl RouterTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a router, replacing any router for the same table.
    pub fn insert(&mut self, router: Router) -> Option<Router> {
        self.routers.insert(router.table.clone(), router)
    }

    #[must_use]
    pub fn get(&self, table: &str) -> Option<&Router> {
        self.routers.get(&table.to_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }

    /// Routers sorted by table name.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Router> {
        let mut routers: Vec<_> = self.routers.values().collect();
        routers.sort_by(|a, b| a.table.cmp(&b.table));
        routers
    }
}

impl FromIterator<Router> for RouterTable {
    fn from_iter<I: IntoIterator<Item = Router>>(iter: I) -> Self {
        let mut table = Self::new();
        for router in iter {
            table.insert(router);
        }
        table
    }
}
