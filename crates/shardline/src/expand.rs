//! Expansion of collection parameters bound to a single `?`.

use tracing::debug;

use crate::error::{Result, ShardError};
use crate::lexical::{SegmentKind, segments};
use crate::value::Value;

/// Rewrites every `?` bound to a [`Value::List`] into one placeholder per
/// element and flattens the parameters to match.
///
/// Placeholders inside string literals and comments are not counted.
///
/// ```
/// use shardline::{expand_list_parameters, Value};
///
/// let params = vec![Value::List(vec![Value::Int(1), Value::Int(2)]), Value::Int(9)];
/// let (sql, flat) = expand_list_parameters("SELECT * FROM t WHERE id IN (?) AND k = ?", &params)?;
/// assert_eq!(sql, "SELECT * FROM t WHERE id IN (?, ?) AND k = ?");
/// assert_eq!(flat, vec![Value::Int(1), Value::Int(2), Value::Int(9)]);
/// # Ok::<(), shardline::ShardError>(())
/// ```
///
/// # Errors
///
/// [`ShardError::InvalidShardValue`] for an empty list, which would leave
/// an empty `IN ()`.
pub fn expand_list_parameters(sql: &str, params: &[Value]) -> Result<(String, Vec<Value>)> {
    if !params.iter().any(|p| matches!(p, Value::List(_))) {
        return Ok((sql.to_string(), params.to_vec()));
    }

    let mut out = String::with_capacity(sql.len() + params.len() * 3);
    let mut flat = Vec::with_capacity(params.len());
    let mut bound = params.iter();
    for segment in segments(sql) {
        let text = &sql[segment.range];
        if segment.kind != SegmentKind::Code {
            out.push_str(text);
            continue;
        }
        for c in text.chars() {
            if c != '?' {
                out.push(c);
                continue;
            }
            match bound.next() {
                Some(Value::List(items)) if items.is_empty() => {
                    return Err(ShardError::invalid_value("IN list", "empty list"));
                }
                Some(Value::List(items)) => {
                    out.push_str(&vec!["?"; items.len()].join(", "));
                    flat.extend(items.iter().cloned());
                }
                Some(value) => {
                    out.push('?');
                    flat.push(value.clone());
                }
                None => out.push('?'),
            }
        }
    }
    flat.extend(bound.cloned());
    debug!(before = params.len(), after = flat.len(), "expanded list parameters");
    Ok((out, flat))
}
