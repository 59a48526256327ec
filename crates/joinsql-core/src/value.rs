//! Dynamic SQL values.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A dynamically-typed SQL scalar.
///
/// Used for batch-scope keys, cursor tuples and literal rendering. The serde
/// representation is externally tagged so that a value survives a round trip
/// with its exact variant (an `Int` never comes back as a `BigInt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,

    /// Boolean value
    Bool(bool),

    /// 8-bit signed integer
    TinyInt(i8),

    /// 16-bit signed integer
    SmallInt(i16),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    BigInt(i64),

    /// 32-bit floating point
    Float(f32),

    /// 64-bit floating point
    Double(f64),

    /// Arbitrary precision decimal (stored as string)
    Decimal(String),

    /// Text string
    Text(String),
}

/// Coarse runtime type of a [`Value`], as used for cast selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    Decimal,
    Text,
}

impl Value {
    /// Coarse runtime type of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::TinyInt(_) | Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) => {
                ValueKind::Integer
            }
            Value::Float(_) | Value::Double(_) => ValueKind::Float,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Check if this value is numeric (integer, float or decimal).
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self.kind(),
            ValueKind::Integer | ValueKind::Float | ValueKind::Decimal
        )
    }

    /// Try to convert this value to an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(i64::from(*v)),
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            Value::Bool(v) => Some(if *v { 1 } else { 0 }),
            _ => None,
        }
    }

    /// Try to convert this value to an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::TinyInt(v) => Some(f64::from(*v)),
            Value::SmallInt(v) => Some(f64::from(*v)),
            Value::Int(v) => Some(f64::from(*v)),
            Value::BigInt(v) => Some(*v as f64),
            Value::Decimal(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Compare two values the way SQL would.
    ///
    /// Returns `None` when either side is NULL or the types are not
    /// comparable (e.g. text against a number).
    pub fn sql_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (a, b) if a.kind() == ValueKind::Integer && b.kind() == ValueKind::Integer => {
                Some(a.as_i64()?.cmp(&b.as_i64()?))
            }
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64()?.partial_cmp(&b.as_f64()?),
            _ => None,
        }
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::TinyInt(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_variants() {
        assert_eq!(Value::Int(1).kind(), ValueKind::Integer);
        assert_eq!(Value::BigInt(1).kind(), ValueKind::Integer);
        assert_eq!(Value::Double(1.5).kind(), ValueKind::Float);
        assert_eq!(Value::Decimal("1.50".into()).kind(), ValueKind::Decimal);
        assert_eq!(Value::from("a").kind(), ValueKind::Text);
        assert_eq!(Value::from(None::<i64>).kind(), ValueKind::Null);
        assert!(Value::Decimal("2".into()).is_numeric());
        assert!(!Value::Bool(true).is_numeric());
    }

    #[test]
    fn sql_cmp_follows_sql_semantics() {
        assert_eq!(
            Value::Int(3).sql_cmp(&Value::BigInt(10)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Double(2.5).sql_cmp(&Value::Int(2)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::from("b").sql_cmp(&Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Null.sql_cmp(&Value::Int(1)), None);
        assert_eq!(Value::from("1").sql_cmp(&Value::Int(1)), None);
    }

    #[test]
    fn serde_keeps_exact_variant() {
        let json = serde_json::to_string(&Value::Int(7)).unwrap();
        assert_eq!(json, r#"{"Int":7}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Int(7));

        let null: Value = serde_json::from_str(r#""Null""#).unwrap();
        assert_eq!(null, Value::Null);
    }
}
