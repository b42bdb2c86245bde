//! Shard overrides carried in a leading `/* column:value */` comment.
//!
//! ```
//! use shardline::HeadComment;
//!
//! let (head, body) = HeadComment::split("/* user_id:?0 */ SELECT * FROM orders");
//! assert_eq!(body, "SELECT * FROM orders");
//! assert_eq!(head.get("USER_ID"), Some("?0"));
//! ```

use crate::params::ParameterSupplier;
use crate::value::Value;

/// Column → value-reference pairs from a head comment, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadComment {
    entries: Vec<(String, String)>,
}

impl HeadComment {
    /// Splits a leading head comment off `sql`.
    ///
    /// Returns the parsed comment (empty when there is none) and the
    /// statement text after it, trimmed. Optimizer hints (`/*+ */`) are not
    /// head comments and are left in place.
    #[must_use]
    pub fn split(sql: &str) -> (Self, &str) {
        let trimmed = sql.trim();
        let Some(rest) = trimmed.strip_prefix("/*") else {
            return (Self::default(), trimmed);
        };
        if rest.starts_with('+') {
            return (Self::default(), trimmed);
        }
        let Some(close) = rest.find("*/") else {
            return (Self::default(), trimmed);
        };
        let head = Self::parse(&rest[..close]);
        (head, rest[close + 2..].trim())
    }

    /// Parses the inside of a head comment: `k:v` entries separated by
    /// commas. Entries that do not split into exactly two parts on `:` are
    /// skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let entries = text
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.split(':');
                let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return None;
                };
                let (key, value) = (key.trim(), value.trim());
                (!key.is_empty() && !value.is_empty())
                    .then(|| (key.to_string(), value.to_string()))
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value reference for `column`, ignoring case.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column))
            .map(|(_, v)| v.as_str())
    }

    /// Every value reference given for `column`.
    pub fn values_for<'s, 'c>(&'s self, column: &'c str) -> impl Iterator<Item = &'s str> + 'c
    where
        's: 'c,
    {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(column))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Resolves a head-comment value reference.
///
/// A name bound as a named parameter resolves to that parameter, `?N` to
/// the positional parameter with ordinal `N`, and anything else is taken
/// as literal text.
#[must_use]
pub fn resolve_value(reference: &str, params: &dyn ParameterSupplier) -> Value {
    if let Some(value) = params.named_parameter(reference) {
        return value.clone();
    }
    if let Some(ordinal) = reference
        .strip_prefix('?')
        .and_then(|n| n.parse::<usize>().ok())
    {
        if let Some(value) = params.parameter(ordinal) {
            return value.clone();
        }
    }
    Value::Text(reference.to_string())
}
