//! Dynamically typed values: bound parameters, shard column values and
//! result scalars.

use std::cmp::Ordering;
use std::fmt;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{NaiveDate, NaiveDateTime};
use shardline_sql::ast::Literal;

use crate::error::{Result, ShardError};

/// A single SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// A collection bound to a single `?`, expanded before execution.
    List(Vec<Value>),
}

/// Numeric view used for cross-width comparisons.
enum Numeric<'a> {
    Integer(i64),
    Float(f64),
    Decimal(&'a BigDecimal),
}

impl Value {
    /// Converts a literal from the SQL text.
    #[must_use]
    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Integer(n) => Self::BigInt(*n),
            Literal::Float(f) => Self::Double(*f),
            Literal::String(s) => Self::Text(s.clone()),
            Literal::Blob(b) => Self::Bytes(b.clone()),
            Literal::Boolean(b) => Self::Bool(*b),
            Literal::Null => Self::Null,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// SQL type name, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOLEAN",
            Self::TinyInt(_) => "TINYINT",
            Self::SmallInt(_) => "SMALLINT",
            Self::Int(_) => "INT",
            Self::BigInt(_) => "BIGINT",
            Self::Float(_) => "FLOAT",
            Self::Double(_) => "DOUBLE",
            Self::Decimal(_) => "DECIMAL",
            Self::Text(_) => "TEXT",
            Self::Bytes(_) => "BLOB",
            Self::Date(_) => "DATE",
            Self::DateTime(_) => "DATETIME",
            Self::List(_) => "LIST",
        }
    }

    /// The value as a 64-bit integer, if it is one. Floats and decimals
    /// qualify only when they carry no fractional part.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::TinyInt(n) => Some(i64::from(*n)),
            Self::SmallInt(n) => Some(i64::from(*n)),
            Self::Int(n) => Some(i64::from(*n)),
            Self::BigInt(n) => Some(*n),
            Self::Float(f) => integral_f64(f64::from(*f)),
            Self::Double(f) => integral_f64(*f),
            Self::Decimal(d) if d.is_integer() => d.to_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    fn numeric(&self) -> Option<Numeric<'_>> {
        match self {
            Self::TinyInt(n) => Some(Numeric::Integer(i64::from(*n))),
            Self::SmallInt(n) => Some(Numeric::Integer(i64::from(*n))),
            Self::Int(n) => Some(Numeric::Integer(i64::from(*n))),
            Self::BigInt(n) => Some(Numeric::Integer(*n)),
            Self::Float(f) => Some(Numeric::Float(f64::from(*f))),
            Self::Double(f) => Some(Numeric::Float(*f)),
            Self::Decimal(d) => Some(Numeric::Decimal(d)),
            _ => None,
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::TinyInt(_)
            | Self::SmallInt(_)
            | Self::Int(_)
            | Self::BigInt(_)
            | Self::Float(_)
            | Self::Double(_)
            | Self::Decimal(_) => 2,
            Self::Text(_) => 3,
            Self::Bytes(_) => 4,
            Self::Date(_) | Self::DateTime(_) => 5,
            Self::List(_) => 6,
        }
    }

    /// Total natural ordering used by MAX / MIN and ORDER BY merges.
    ///
    /// NULL sorts first. Numbers compare by value regardless of width,
    /// dates compare with datetimes at midnight, and values of unrelated
    /// kinds are ordered by kind.
    #[must_use]
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        if let (Some(a), Some(b)) = (self.numeric(), other.numeric()) {
            return compare_numeric(&a, &b);
        }
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::Date(a), Self::DateTime(b)) => midnight(*a).cmp(b),
            (Self::DateTime(a), Self::Date(b)) => a.cmp(&midnight(*b)),
            (Self::List(a), Self::List(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.natural_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Type-aware addition used to re-reduce SUM results.
    ///
    /// Integers of the same width stay at that width; mixed integer widths
    /// widen to BIGINT. Decimals absorb integers.
    ///
    /// # Errors
    ///
    /// [`ShardError::AggregateOverflow`] when an integer sum overflows and
    /// [`ShardError::UnsupportedAggregate`] when the operand types have no
    /// adder.
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        let overflow = || ShardError::AggregateOverflow("SUM".to_string());
        let sum = match (self, other) {
            (Self::TinyInt(a), Self::TinyInt(b)) => {
                Self::TinyInt(a.checked_add(*b).ok_or_else(overflow)?)
            }
            (Self::SmallInt(a), Self::SmallInt(b)) => {
                Self::SmallInt(a.checked_add(*b).ok_or_else(overflow)?)
            }
            (Self::Int(a), Self::Int(b)) => Self::Int(a.checked_add(*b).ok_or_else(overflow)?),
            (Self::Float(a), Self::Float(b)) => Self::Float(a + b),
            (Self::Float(_) | Self::Double(_), Self::Float(_) | Self::Double(_)) => {
                match (self.numeric(), other.numeric()) {
                    (Some(Numeric::Float(a)), Some(Numeric::Float(b))) => Self::Double(a + b),
                    _ => return Err(unsupported_sum(self, other)),
                }
            }
            (Self::Decimal(a), Self::Decimal(b)) => Self::Decimal(a + b),
            (Self::Decimal(d), int) | (int, Self::Decimal(d)) if is_integer_kind(int) => {
                let n = int.as_i64().ok_or_else(|| unsupported_sum(self, other))?;
                Self::Decimal(d + BigDecimal::from(n))
            }
            (a, b) if is_integer_kind(a) && is_integer_kind(b) => {
                let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) else {
                    return Err(unsupported_sum(self, other));
                };
                Self::BigInt(a.checked_add(b).ok_or_else(overflow)?)
            }
            _ => return Err(unsupported_sum(self, other)),
        };
        Ok(sum)
    }
}

const fn is_integer_kind(value: &Value) -> bool {
    matches!(
        value,
        Value::TinyInt(_) | Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_)
    )
}

fn unsupported_sum(a: &Value, b: &Value) -> ShardError {
    ShardError::UnsupportedAggregate(format!(
        "SUM over {} and {}",
        a.kind_name(),
        b.kind_name()
    ))
}

fn integral_f64(value: f64) -> Option<i64> {
    BigDecimal::try_from(value)
        .ok()
        .filter(BigDecimal::is_integer)
        .and_then(|d| d.to_i64())
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn compare_numeric(a: &Numeric<'_>, b: &Numeric<'_>) -> Ordering {
    match (a, b) {
        (Numeric::Integer(a), Numeric::Integer(b)) => a.cmp(b),
        (Numeric::Decimal(a), Numeric::Decimal(b)) => a.cmp(b),
        (Numeric::Decimal(a), Numeric::Integer(b)) => (*a).cmp(&BigDecimal::from(*b)),
        (Numeric::Integer(a), Numeric::Decimal(b)) => BigDecimal::from(*a).cmp(b),
        _ => to_f64(a).total_cmp(&to_f64(b)),
    }
}

// Lossy above 2^53; only used to order integers against floats.
#[allow(clippy::cast_precision_loss)]
fn to_f64(n: &Numeric<'_>) -> f64 {
    match n {
        Numeric::Integer(i) => *i as f64,
        Numeric::Float(f) => *f,
        Numeric::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::TinyInt(n) => write!(f, "{n}"),
            Self::SmallInt(n) => write!(f, "{n}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::BigInt(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Double(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Bytes(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    BigDecimal => Decimal,
    String => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    Vec<Value> => List,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
