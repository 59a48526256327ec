//! Opaque pagination cursors.
//!
//! Keyset cursors carry the sort-key values of the last row a client saw.
//! They are base64 (standard alphabet) over a JSON object whose keys are the
//! sort-key columns in order. Offset cursors follow the relay
//! `arrayconnection:<n>` convention.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use joinsql_core::{CursorErrorKind, Error, OrderColumn, Result, Value};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const OFFSET_PREFIX: &str = "arrayconnection:";

/// Ordered `(column, value)` tuple of a keyset cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    pairs: Vec<(String, Value)>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column value. Later duplicates are not checked here; they
    /// are rejected on decode.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.pairs.push((column.into(), value.into()));
        self
    }

    /// Build a cursor for `row` under `sort_key`, in sort-key order.
    pub fn from_row(sort_key: &[OrderColumn], row: &[Value]) -> Self {
        Self {
            pairs: sort_key
                .iter()
                .zip(row)
                .map(|(c, v)| (c.column.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn pairs(&self) -> &[(String, Value)] {
        &self.pairs
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.pairs.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as an opaque string.
    ///
    /// NaN and infinite floats are rejected: JSON would carry them as
    /// `null` and the cursor would no longer decode.
    pub fn encode(&self) -> Result<String> {
        if let Some((column, _)) = self.pairs.iter().find(|(_, v)| !is_finite(v)) {
            return Err(Error::cursor(
                CursorErrorKind::NonFinite,
                format!("cursor column \"{column}\" holds a non-finite float"),
            ));
        }
        let json = serde_json::to_vec(self)?;
        Ok(BASE64.encode(json))
    }

    /// Decode an opaque string produced by [`Cursor::encode`].
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| malformed(format!("cursor is not valid base64: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| malformed(format!("cursor payload: {e}")))
    }

    /// Values in the order of `sort_key`.
    ///
    /// Fails when the cursor names a column the sort key does not have, or
    /// lacks one of the sort-key columns.
    pub fn aligned_values(&self, sort_key: &[OrderColumn]) -> Result<Vec<Value>> {
        if let Some((column, _)) = self
            .pairs
            .iter()
            .find(|(c, _)| !sort_key.iter().any(|k| &k.column == c))
        {
            return Err(Error::cursor(
                CursorErrorKind::UnknownColumn,
                format!("cursor column \"{column}\" is not part of the sort key"),
            ));
        }
        sort_key
            .iter()
            .map(|k| {
                self.get(&k.column).cloned().ok_or_else(|| {
                    Error::cursor(
                        CursorErrorKind::MissingColumn,
                        format!("cursor lacks sort key column \"{}\"", k.column),
                    )
                })
            })
            .collect()
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (column, value) in &self.pairs {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct CursorVisitor;

        impl<'de> Visitor<'de> for CursorVisitor {
            type Value = Cursor;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of sort-key column values")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Cursor, A::Error> {
                let mut pairs: Vec<(String, Value)> = Vec::new();
                while let Some((column, value)) = access.next_entry::<String, Value>()? {
                    if pairs.iter().any(|(c, _)| *c == column) {
                        return Err(de::Error::custom(format!(
                            "duplicate cursor column \"{column}\""
                        )));
                    }
                    pairs.push((column, value));
                }
                Ok(Cursor { pairs })
            }
        }

        deserializer.deserialize_map(CursorVisitor)
    }
}

/// Opaque cursor for the row at zero-based position `offset`.
pub fn offset_to_cursor(offset: u64) -> String {
    BASE64.encode(format!("{OFFSET_PREFIX}{offset}"))
}

/// Position encoded by an offset cursor.
pub fn cursor_to_offset(cursor: &str) -> Result<u64> {
    let bytes = BASE64
        .decode(cursor.trim())
        .map_err(|e| malformed(format!("offset cursor is not valid base64: {e}")))?;
    let text = String::from_utf8(bytes).map_err(|_| malformed("offset cursor is not UTF-8"))?;
    text.strip_prefix(OFFSET_PREFIX)
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(|| malformed(format!("not an offset cursor: '{text}'")))
}

fn is_finite(value: &Value) -> bool {
    match value {
        Value::Float(v) => v.is_finite(),
        Value::Double(v) => v.is_finite(),
        _ => true,
    }
}

fn malformed(message: impl Into<String>) -> Error {
    Error::cursor(CursorErrorKind::Malformed, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sort_key() -> Vec<OrderColumn> {
        vec![OrderColumn::desc("created_at"), OrderColumn::desc("id")]
    }

    #[test]
    fn round_trip_keeps_order_and_variants() {
        let cursor = Cursor::new()
            .with("created_at", "2024-01-05T10:00:00Z")
            .with("id", Value::Int(42))
            .with("score", Value::Decimal("1.10".into()))
            .with("deleted", Value::Null)
            .with("pinned", Value::Bool(true))
            .with("rank", Value::TinyInt(-3))
            .with("bucket", Value::SmallInt(512))
            .with("seq", Value::BigInt(9_007_199_254_740_993))
            .with("weight", Value::Float(1.5))
            .with("ratio", Value::Double(-0.125));
        let encoded = cursor.encode().unwrap();
        let decoded = Cursor::decode(&encoded).unwrap();
        assert_eq!(decoded, cursor);
        assert_eq!(decoded.pairs()[1], ("id".to_string(), Value::Int(42)));
        assert_eq!(decoded.get("seq"), Some(&Value::BigInt(9_007_199_254_740_993)));
    }

    #[test]
    fn non_finite_floats_are_not_encoded() {
        for value in [
            Value::Double(f64::NAN),
            Value::Double(f64::INFINITY),
            Value::Float(f32::NEG_INFINITY),
            Value::Float(f32::NAN),
        ] {
            let cursor = Cursor::new().with("id", 1_i64).with("score", value);
            let err = cursor.encode().unwrap_err();
            assert_eq!(err.cursor_kind(), Some(CursorErrorKind::NonFinite));
            assert!(err.to_string().contains("\"score\""));
        }
    }

    #[test]
    fn key_order_is_not_alphabetical() {
        let cursor = Cursor::new().with("z", 1_i64).with("a", 2_i64);
        let json = serde_json::to_string(&cursor).unwrap();
        assert_eq!(json, r#"{"z":{"BigInt":1},"a":{"BigInt":2}}"#);
    }

    #[test]
    fn malformed_inputs() {
        let inputs: Vec<String> = vec![
            "%%%".to_string(),
            BASE64.encode("not json"),
            BASE64.encode("[1,2]"),
            BASE64.encode(r#"{"id":{"Int":1},"id":{"Int":2}}"#),
            BASE64.encode(r#"{"id":{"Unknown":1}}"#),
            BASE64.encode([0xff_u8, 0xfe]),
        ];
        for bad in &inputs {
            let err = Cursor::decode(bad).unwrap_err();
            assert_eq!(err.cursor_kind(), Some(CursorErrorKind::Malformed), "{bad}");
        }
    }

    #[test]
    fn aligned_values_follow_sort_key() {
        let cursor = Cursor::new().with("id", 7_i64).with("created_at", "2024-01-01");
        let values = cursor.aligned_values(&sort_key()).unwrap();
        assert_eq!(values, vec![Value::from("2024-01-01"), Value::BigInt(7)]);
    }

    #[test]
    fn aligned_values_reject_mismatch() {
        let short = Cursor::new().with("created_at", "2024-01-01");
        assert_eq!(
            short.aligned_values(&sort_key()).unwrap_err().cursor_kind(),
            Some(CursorErrorKind::MissingColumn)
        );
        let extra = Cursor::new()
            .with("created_at", "2024-01-01")
            .with("id", 1_i64)
            .with("title", "x");
        assert_eq!(
            extra.aligned_values(&sort_key()).unwrap_err().cursor_kind(),
            Some(CursorErrorKind::UnknownColumn)
        );
    }

    #[test]
    fn from_row_pairs_sort_key() {
        let cursor = Cursor::from_row(&sort_key(), &[Value::from("d"), Value::Int(3)]);
        assert_eq!(cursor.get("id"), Some(&Value::Int(3)));
        assert_eq!(cursor.len(), 2);
    }

    #[test]
    fn offset_cursors() {
        let c = offset_to_cursor(19);
        assert_eq!(c, "YXJyYXljb25uZWN0aW9uOjE5");
        assert_eq!(cursor_to_offset(&c).unwrap(), 19);
        let err = cursor_to_offset(&BASE64.encode("arrayconnection:x")).unwrap_err();
        assert_eq!(err.cursor_kind(), Some(CursorErrorKind::Malformed));
        assert!(cursor_to_offset("!!").is_err());
    }
}
