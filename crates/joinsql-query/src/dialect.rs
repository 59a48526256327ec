//! Per-database syntax rules.
//!
//! [`Dialect`] is a closed, stateless enum. Every operation is a pure
//! function of the variant and its arguments, so a single value can be shared
//! by any number of concurrent compilations.

use crate::cast;
use crate::clause::Limit;
use joinsql_core::{ConfigErrorKind, Error, Value, quote_ident, quote_ident_mssql, quote_ident_mysql};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Name of the window-count column every paginated fragment exposes.
pub const TOTAL_COLUMN: &str = "$total";

/// Always-true predicate used when a WHERE list is empty.
pub const TAUTOLOGY: &str = "1>0";

/// Alias of the batch-key temp table.
pub const TEMP_TABLE: &str = "temp";

/// Largest row count MySQL and MariaDB accept in `LIMIT`.
const MYSQL_MAX_ROWS: u64 = 18_446_744_073_709_551_615;

/// SQL dialect for generating dialect-specific SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// PostgreSQL (9.3+)
    #[default]
    Postgres,
    /// Oracle (12c+)
    Oracle,
    /// MySQL (8.0.14+, lateral derived tables)
    Mysql,
    /// MariaDB (no lateral derived tables)
    MariaDb,
    /// SQLite (no lateral derived tables)
    Sqlite,
    /// Microsoft SQL Server
    MsSql,
}

/// How a correlated derived table is attached to the enclosing statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LateralStyle {
    /// `[LEFT ]JOIN LATERAL (...) a ON cond`
    JoinLateral,
    /// `CROSS APPLY (...) a` with no trailing `ON`
    CrossApply,
    /// `LEFT JOIN (...) a ON cond`; the body cannot see outer columns, so the
    /// structural predicate lives only in the trailing `ON`
    DerivedJoin,
}

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Dialect; 6] = [
        Dialect::Postgres,
        Dialect::Oracle,
        Dialect::Mysql,
        Dialect::MariaDb,
        Dialect::Sqlite,
        Dialect::MsSql,
    ];

    /// Canonical lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "pg",
            Dialect::Oracle => "oracle",
            Dialect::Mysql => "mysql",
            Dialect::MariaDb => "mariadb",
            Dialect::Sqlite => "sqlite",
            Dialect::MsSql => "mssql",
        }
    }

    /// Quote an identifier for this dialect.
    ///
    /// Embedded quote characters are escaped by doubling them, so quoting an
    /// already quoted identifier yields a different identifier.
    pub fn quote(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Oracle | Dialect::Sqlite => quote_ident(name),
            Dialect::Mysql | Dialect::MariaDb => quote_ident_mysql(name),
            Dialect::MsSql => quote_ident_mssql(name),
        }
    }

    /// Keyword placed between a table and its alias.
    pub const fn as_indicator(self) -> &'static str {
        match self {
            Dialect::Oracle => "",
            _ => "AS",
        }
    }

    /// `table AS "alias"` (or `table "alias"` on Oracle). The table is
    /// emitted verbatim.
    pub fn alias_table(self, table: &str, alias: &str) -> String {
        match self.as_indicator() {
            "" => format!("{} {}", table, self.quote(alias)),
            kw => format!("{} {} {}", table, kw, self.quote(alias)),
        }
    }

    /// `"alias"."column"`.
    pub fn qualify(self, alias: &str, column: &str) -> String {
        format!("{}.{}", self.quote(alias), self.quote(column))
    }

    /// Concatenated key over several columns, NULL when all of them are empty.
    pub fn composite_key(self, alias: &str, columns: &[&str]) -> String {
        let keys: Vec<String> = columns.iter().map(|c| self.qualify(alias, c)).collect();
        match self {
            Dialect::Sqlite | Dialect::Oracle => format!("NULLIF({}, '')", keys.join(" || ")),
            _ => format!("NULLIF(CONCAT({}), '')", keys.join(", ")),
        }
    }

    /// Render the trailing limit/offset clause.
    ///
    /// Returns an empty string when nothing needs to be emitted (Oracle with
    /// neither bound).
    pub fn limit_and_offset(self, limit: Limit, offset: Option<u64>) -> String {
        match self {
            Dialect::Postgres => {
                let mut sql = match limit {
                    Limit::All => "LIMIT ALL".to_string(),
                    Limit::Rows(n) => format!("LIMIT {n}"),
                };
                if let Some(m) = offset {
                    sql.push_str(&format!(" OFFSET {m}"));
                }
                sql
            }
            Dialect::Sqlite => {
                let mut sql = match limit {
                    Limit::All => "LIMIT -1".to_string(),
                    Limit::Rows(n) => format!("LIMIT {n}"),
                };
                if let Some(m) = offset {
                    sql.push_str(&format!(" OFFSET {m}"));
                }
                sql
            }
            Dialect::Mysql | Dialect::MariaDb => {
                let mut sql = format!("LIMIT {}", limit.rows().unwrap_or(MYSQL_MAX_ROWS));
                if let Some(m) = offset {
                    sql.push_str(&format!(" OFFSET {m}"));
                }
                sql
            }
            Dialect::Oracle => match (limit, offset) {
                (Limit::Rows(n), Some(m)) => format!("OFFSET {m} ROWS FETCH NEXT {n} ROWS ONLY"),
                (Limit::Rows(n), None) => format!("FETCH FIRST {n} ROWS ONLY"),
                (Limit::All, Some(m)) => format!("OFFSET {m} ROWS"),
                (Limit::All, None) => String::new(),
            },
            Dialect::MsSql => {
                let mut sql = format!("OFFSET {} ROWS", offset.unwrap_or(0));
                if let Limit::Rows(n) = limit {
                    sql.push_str(&format!(" FETCH NEXT {n} ROWS ONLY"));
                }
                sql
            }
        }
    }

    /// Cast `column_expr` so it compares with values shaped like `sample`.
    pub fn cast_for_comparison(self, column_expr: &str, sample: &Value) -> String {
        cast::cast_for_comparison(self, column_expr, sample)
    }

    /// Attachment shape of correlated derived tables.
    pub const fn lateral_style(self) -> LateralStyle {
        match self {
            Dialect::Postgres | Dialect::Oracle | Dialect::Mysql => LateralStyle::JoinLateral,
            Dialect::MsSql => LateralStyle::CrossApply,
            Dialect::Sqlite | Dialect::MariaDb => LateralStyle::DerivedJoin,
        }
    }

    /// Whether `(a, b) < (x, y)` is understood.
    pub const fn supports_row_value_comparison(self) -> bool {
        !matches!(self, Dialect::Oracle | Dialect::MsSql)
    }

    /// Quoted `$total` column.
    pub fn total_column(self) -> String {
        self.quote(TOTAL_COLUMN)
    }

    /// Render a value as an injection-safe SQL literal.
    pub fn literal(self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => match (self, b) {
                (Dialect::Postgres | Dialect::Mysql | Dialect::MariaDb, true) => "TRUE".into(),
                (Dialect::Postgres | Dialect::Mysql | Dialect::MariaDb, false) => "FALSE".into(),
                (_, true) => "1".into(),
                (_, false) => "0".into(),
            },
            Value::TinyInt(v) => v.to_string(),
            Value::SmallInt(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::Float(v) => {
                if v.is_finite() {
                    v.to_string()
                } else {
                    non_finite(f64::from(*v))
                }
            }
            Value::Double(v) => {
                if v.is_finite() {
                    v.to_string()
                } else {
                    non_finite(*v)
                }
            }
            Value::Decimal(s) => {
                if matches(numeric_pattern(), s) {
                    s.clone()
                } else {
                    self.string_literal(s)
                }
            }
            Value::Text(s) => {
                if self == Dialect::Oracle && matches(timestamp_pattern(), s) {
                    let normalized = s.replacen('T', " ", 1);
                    let normalized = normalized.trim_end_matches('Z');
                    format!("TIMESTAMP {}", self.string_literal(normalized))
                } else {
                    self.string_literal(s)
                }
            }
        }
    }

    fn string_literal(self, s: &str) -> String {
        let escaped = s.replace('\'', "''");
        match self {
            Dialect::Mysql | Dialect::MariaDb => format!("'{}'", escaped.replace('\\', "\\\\")),
            _ => format!("'{escaped}'"),
        }
    }

    /// Batch-key temp table holding one row per value, aliased `temp` with a
    /// single column named `column`.
    pub fn values_table(self, column: &str, values: &[Value]) -> String {
        let col = self.quote(column);
        let literals: Vec<String> = values.iter().map(|v| self.literal(v)).collect();
        match self {
            Dialect::Postgres | Dialect::MsSql => {
                let rows: Vec<String> = literals.iter().map(|l| format!("({l})")).collect();
                format!("FROM (VALUES {}) {TEMP_TABLE}({col})", rows.join(","))
            }
            Dialect::Mysql => {
                let rows: Vec<String> = literals.iter().map(|l| format!("ROW({l})")).collect();
                format!("FROM (VALUES {}) {TEMP_TABLE}({col})", rows.join(","))
            }
            Dialect::Sqlite | Dialect::MariaDb | Dialect::Oracle => {
                let from_dual = if self == Dialect::Oracle { " FROM DUAL" } else { "" };
                let rows: Vec<String> = literals
                    .iter()
                    .enumerate()
                    .map(|(i, l)| {
                        if i == 0 {
                            let kw = self.as_indicator();
                            let sep = if kw.is_empty() { String::new() } else { format!("{kw} ") };
                            format!("SELECT {l} {sep}{col}{from_dual}")
                        } else {
                            format!("SELECT {l}{from_dual}")
                        }
                    })
                    .collect();
                format!("FROM ({}) {TEMP_TABLE}", rows.join(" UNION ALL "))
            }
        }
    }

    /// `temp."column"`: reference to the batch-key temp table column.
    pub fn temp_column(self, column: &str) -> String {
        format!("{TEMP_TABLE}.{}", self.quote(column))
    }

    /// `expr IN (v1, v2, ...)` over injection-safe literals.
    pub fn in_list(self, expr: &str, values: &[Value]) -> String {
        let literals: Vec<String> = values.iter().map(|v| self.literal(v)).collect();
        format!("{expr} IN ({})", literals.join(", "))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pg" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "oracle" => Ok(Dialect::Oracle),
            "mysql" | "mysql8" => Ok(Dialect::Mysql),
            "mariadb" => Ok(Dialect::MariaDb),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mssql" | "sqlserver" => Ok(Dialect::MsSql),
            _ => Err(Error::config(
                ConfigErrorKind::UnknownDialect,
                format!("unknown dialect '{s}'"),
            )),
        }
    }
}

fn non_finite(v: f64) -> String {
    tracing::warn!(value = %v, "non-finite float rendered as NULL");
    "NULL".to_string()
}

fn matches(pattern: Option<&Regex>, s: &str) -> bool {
    pattern.is_some_and(|re| re.is_match(s))
}

fn numeric_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?([eE][+-]?\d+)?$").ok())
        .as_ref()
}

fn timestamp_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d+)?Z?$").ok())
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("PG".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("MySQL8".parse::<Dialect>().unwrap(), Dialect::Mysql);
        assert_eq!("sqlserver".parse::<Dialect>().unwrap(), Dialect::MsSql);
        assert_eq!("sqlite3".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        let err = "db2".parse::<Dialect>().unwrap_err();
        assert_eq!(err.config_kind(), Some(ConfigErrorKind::UnknownDialect));
        for d in Dialect::ALL {
            assert_eq!(d.name().parse::<Dialect>().unwrap(), d);
        }
    }

    // ==================== Quote Escaping Tests ====================

    #[test]
    fn quote_escapes_per_dialect() {
        assert_eq!(Dialect::Postgres.quote("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(Dialect::Oracle.quote("x"), "\"x\"");
        assert_eq!(Dialect::MariaDb.quote("with`tick"), "`with``tick`");
        assert_eq!(Dialect::MsSql.quote("a]b"), "[a]]b]");
    }

    #[test]
    fn quote_is_not_idempotent() {
        for d in Dialect::ALL {
            let once = d.quote("x");
            assert_ne!(d.quote(&once), once, "{d}");
        }
    }

    #[test]
    fn alias_indicator() {
        assert_eq!(Dialect::Postgres.alias_table("orders", "o"), "orders AS \"o\"");
        assert_eq!(Dialect::Oracle.alias_table("orders", "o"), "orders \"o\"");
        assert_eq!(Dialect::MsSql.alias_table("orders", "o"), "orders AS [o]");
    }

    #[test]
    fn composite_keys() {
        assert_eq!(
            Dialect::Postgres.composite_key("u", &["a", "b"]),
            "NULLIF(CONCAT(\"u\".\"a\", \"u\".\"b\"), '')"
        );
        assert_eq!(
            Dialect::Sqlite.composite_key("u", &["a", "b"]),
            "NULLIF(\"u\".\"a\" || \"u\".\"b\", '')"
        );
        assert_eq!(
            Dialect::MsSql.composite_key("u", &["a"]),
            "NULLIF(CONCAT([u].[a]), '')"
        );
    }

    #[test]
    fn limit_and_offset_forms() {
        let ten = Limit::Rows(10);
        assert_eq!(Dialect::Postgres.limit_and_offset(ten, Some(20)), "LIMIT 10 OFFSET 20");
        assert_eq!(Dialect::Postgres.limit_and_offset(Limit::All, None), "LIMIT ALL");
        assert_eq!(Dialect::Sqlite.limit_and_offset(Limit::All, Some(5)), "LIMIT -1 OFFSET 5");
        assert_eq!(
            Dialect::Mysql.limit_and_offset(Limit::All, None),
            "LIMIT 18446744073709551615"
        );
        assert_eq!(
            Dialect::Oracle.limit_and_offset(ten, Some(20)),
            "OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(Dialect::Oracle.limit_and_offset(ten, None), "FETCH FIRST 10 ROWS ONLY");
        assert_eq!(Dialect::Oracle.limit_and_offset(Limit::All, None), "");
        assert_eq!(
            Dialect::MsSql.limit_and_offset(ten, None),
            "OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(Dialect::MsSql.limit_and_offset(Limit::All, Some(3)), "OFFSET 3 ROWS");
    }

    #[test]
    fn row_value_support() {
        assert!(Dialect::Postgres.supports_row_value_comparison());
        assert!(Dialect::Sqlite.supports_row_value_comparison());
        assert!(!Dialect::Oracle.supports_row_value_comparison());
        assert!(!Dialect::MsSql.supports_row_value_comparison());
    }

    #[test]
    fn literals_are_escaped() {
        let d = Dialect::Postgres;
        assert_eq!(d.literal(&Value::Null), "NULL");
        assert_eq!(d.literal(&Value::Bool(true)), "TRUE");
        assert_eq!(Dialect::MsSql.literal(&Value::Bool(false)), "0");
        assert_eq!(d.literal(&Value::Int(-4)), "-4");
        assert_eq!(d.literal(&Value::Double(1.5)), "1.5");
        assert_eq!(d.literal(&Value::Double(f64::NAN)), "NULL");
        assert_eq!(d.literal(&Value::Decimal("12.50".into())), "12.50");
        assert_eq!(d.literal(&Value::Decimal("1; DROP".into())), "'1; DROP'");
        assert_eq!(d.literal(&Value::from("O'Brien")), "'O''Brien'");
        assert_eq!(Dialect::Mysql.literal(&Value::from("a\\'b")), "'a\\\\''b'");
    }

    #[test]
    fn oracle_timestamps() {
        assert_eq!(
            Dialect::Oracle.literal(&Value::from("2024-03-01T10:20:30.123Z")),
            "TIMESTAMP '2024-03-01 10:20:30.123'"
        );
        assert_eq!(
            Dialect::Postgres.literal(&Value::from("2024-03-01T10:20:30Z")),
            "'2024-03-01T10:20:30Z'"
        );
        assert_eq!(Dialect::Oracle.literal(&Value::from("2024-03-01")), "'2024-03-01'");
    }

    #[test]
    fn values_tables() {
        let ids = [Value::Int(1), Value::Int(2), Value::Int(3)];
        assert_eq!(
            Dialect::Postgres.values_table("id", &ids),
            "FROM (VALUES (1),(2),(3)) temp(\"id\")"
        );
        assert_eq!(
            Dialect::MsSql.values_table("id", &ids[..2]),
            "FROM (VALUES (1),(2)) temp([id])"
        );
        assert_eq!(
            Dialect::Mysql.values_table("id", &ids[..2]),
            "FROM (VALUES ROW(1),ROW(2)) temp(`id`)"
        );
        assert_eq!(
            Dialect::Sqlite.values_table("id", &ids[..2]),
            "FROM (SELECT 1 AS \"id\" UNION ALL SELECT 2) temp"
        );
        assert_eq!(
            Dialect::Oracle.values_table("id", &ids[..2]),
            "FROM (SELECT 1 \"id\" FROM DUAL UNION ALL SELECT 2 FROM DUAL) temp"
        );
        assert_eq!(Dialect::Postgres.temp_column("id"), "temp.\"id\"");
    }
}
