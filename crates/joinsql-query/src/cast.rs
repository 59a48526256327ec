//! Batch-key casts.
//!
//! The batched foreign key is compared against the temp table built from
//! parent-key values. Those values arrive untyped in SQL, so the column side
//! is cast to a type chosen from a sample value. No schema metadata is
//! consulted.

use crate::dialect::Dialect;
use joinsql_core::{Value, ValueKind};

/// SQL type name used to compare against values of `kind`, or `None` when no
/// cast applies.
pub fn cast_type(dialect: Dialect, kind: ValueKind) -> Option<&'static str> {
    let ty = match (kind, dialect) {
        (ValueKind::Null, _) => return None,

        (ValueKind::Integer, Dialect::Postgres | Dialect::MsSql) => "BIGINT",
        (ValueKind::Integer, Dialect::Mysql | Dialect::MariaDb) => "SIGNED",
        (ValueKind::Integer, Dialect::Sqlite) => "INTEGER",
        (ValueKind::Integer, Dialect::Oracle) => "NUMBER",

        (ValueKind::Float, Dialect::Postgres) => "DOUBLE PRECISION",
        (ValueKind::Float, Dialect::Mysql | Dialect::MariaDb) => "DOUBLE",
        (ValueKind::Float, Dialect::Sqlite) => "REAL",
        (ValueKind::Float, Dialect::Oracle) => "BINARY_DOUBLE",
        (ValueKind::Float, Dialect::MsSql) => "FLOAT",

        (ValueKind::Decimal, Dialect::Postgres | Dialect::Sqlite) => "NUMERIC",
        (ValueKind::Decimal, Dialect::Mysql | Dialect::MariaDb) => "DECIMAL(65,30)",
        (ValueKind::Decimal, Dialect::Oracle) => "NUMBER",
        (ValueKind::Decimal, Dialect::MsSql) => "DECIMAL(38,10)",

        (ValueKind::Text, Dialect::Postgres | Dialect::Sqlite) => "TEXT",
        (ValueKind::Text, Dialect::Mysql | Dialect::MariaDb) => "CHAR",
        (ValueKind::Text, Dialect::Oracle) => "VARCHAR2(4000)",
        (ValueKind::Text, Dialect::MsSql) => "NVARCHAR(4000)",

        (ValueKind::Boolean, Dialect::Postgres) => "BOOLEAN",
        (ValueKind::Boolean, Dialect::Mysql | Dialect::MariaDb) => "SIGNED",
        (ValueKind::Boolean, Dialect::Sqlite) => "INTEGER",
        (ValueKind::Boolean, Dialect::Oracle) => "NUMBER(1)",
        (ValueKind::Boolean, Dialect::MsSql) => "BIT",
    };
    Some(ty)
}

/// `CAST(<column_expr> AS <type>)` for the sample's runtime type.
///
/// A NULL sample leaves the expression untouched.
pub fn cast_for_comparison(dialect: Dialect, column_expr: &str, sample: &Value) -> String {
    match cast_type(dialect, sample.kind()) {
        Some(ty) => format!("CAST({column_expr} AS {ty})"),
        None => column_expr.to_string(),
    }
}
