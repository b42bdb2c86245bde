//! Result rows as the merger sees them.

use crate::value::Value;

/// Access to a materialized result row.
///
/// Rows are opaque to the merger apart from named property lookup (for
/// ORDER BY keys) and the row's scalar (for aggregates).
pub trait ResultRow: Sized {
    /// Value of the named property, as produced by a [`ColumnMapper`].
    fn property(&self, name: &str) -> Option<&Value>;

    /// The row's single value, for one-column results.
    fn scalar(&self) -> Option<&Value>;

    /// Builds a one-value row.
    fn from_scalar(value: Value) -> Self;

    /// True for row types that are a bare value with no named properties.
    /// Such rows are ordered by their own value.
    fn is_scalar(&self) -> bool {
        false
    }

    /// Builds a row shaped like `self` holding `value` as its scalar.
    #[must_use]
    fn with_scalar(&self, value: Value) -> Self {
        Self::from_scalar(value)
    }
}

impl ResultRow for Value {
    fn property(&self, _name: &str) -> Option<&Self> {
        None
    }

    fn scalar(&self) -> Option<&Self> {
        Some(self)
    }

    fn from_scalar(value: Self) -> Self {
        value
    }

    fn is_scalar(&self) -> bool {
        true
    }
}

/// An ordered record of labelled values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Appends a column, builder style.
    #[must_use]
    pub fn with(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(label, value);
        self
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((label.into(), value.into()));
    }

    /// Looks a column up by label, ignoring case.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(label))
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(l, v)| (l.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl ResultRow for Row {
    fn property(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }

    fn scalar(&self) -> Option<&Value> {
        self.columns.first().map(|(_, v)| v)
    }

    fn from_scalar(value: Value) -> Self {
        Self::new().with("value", value)
    }

    fn with_scalar(&self, value: Value) -> Self {
        let label = self
            .columns
            .first()
            .map_or_else(|| "value".to_string(), |(l, _)| l.clone());
        Self::new().with(label, value)
    }
}

/// Translates an SQL column or alias name into the property name rows are
/// keyed by.
pub trait ColumnMapper {
    fn map(&self, column: &str) -> String;
}

/// Keeps column names as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl ColumnMapper for IdentityMapper {
    fn map(&self, column: &str) -> String {
        column.to_string()
    }
}

impl<F> ColumnMapper for F
where
    F: Fn(&str) -> String,
{
    fn map(&self, column: &str) -> String {
        self(column)
    }
}

/// Maps `snake_case` column names to `camelCase` properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseMapper;

impl ColumnMapper for CamelCaseMapper {
    fn map(&self, column: &str) -> String {
        let mut out = String::with_capacity(column.len());
        let mut upper = false;
        for c in column.chars() {
            if c == '_' {
                upper = !out.is_empty();
            } else if upper {
                out.extend(c.to_uppercase());
                upper = false;
            } else {
                out.push(c);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_ignores_case() {
        let row = Row::new().with("user_id", 7).with("Name", "bob");
        assert_eq!(row.get("USER_ID"), Some(&Value::Int(7)));
        assert_eq!(row.property("name"), Some(&Value::Text("bob".into())));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.scalar(), Some(&Value::Int(7)));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_with_scalar_keeps_label() {
        let row = Row::new().with("COUNT(*)", 3_i64);
        let merged = row.with_scalar(Value::BigInt(9));
        assert_eq!(merged.iter().next(), Some(("COUNT(*)", &Value::BigInt(9))));
        assert_eq!(Row::from_scalar(Value::Null).get("value"), Some(&Value::Null));
    }

    #[test]
    fn test_value_rows() {
        let v = Value::Int(3);
        assert_eq!(v.scalar(), Some(&Value::Int(3)));
        assert_eq!(v.property("anything"), None);
    }

    #[test]
    fn test_mappers() {
        assert_eq!(IdentityMapper.map("user_id"), "user_id");
        assert_eq!(CamelCaseMapper.map("created_at_ms"), "createdAtMs");
        assert_eq!(CamelCaseMapper.map("_id"), "id");
        let upper = |c: &str| c.to_uppercase();
        assert_eq!(upper.map("id"), "ID");
    }
}
