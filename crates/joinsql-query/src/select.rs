//! Derived-table SELECT bodies shared by both pagination modes.

use crate::clause::{Limit, Order};
use crate::dialect::Dialect;
use crate::join::{LateralJoin, PageOptions};

/// One window-counted, ordered and limited select over a single table.
#[derive(Debug, Clone)]
pub struct PagedSelect<'a> {
    /// Table name, emitted verbatim
    pub table: &'a str,
    /// Unquoted alias of the table and of the resulting derived table
    pub alias: &'a str,
    /// Rendered WHERE expression
    pub filter: String,
    pub order: &'a Order,
    pub limit: Limit,
    pub offset: Option<u64>,
}

impl PagedSelect<'_> {
    /// The inner `SELECT ...` text, one clause per line.
    pub fn body(&self, dialect: Dialect, options: &PageOptions) -> String {
        let mut lines = vec![
            format!(
                "SELECT {}.*, COUNT(*) OVER () AS {}",
                dialect.quote(self.alias),
                dialect.total_column()
            ),
            format!("FROM {}", dialect.alias_table(self.table, self.alias)),
        ];
        if let Some(extra) = &options.extra_join {
            lines.push(format!(
                "LEFT JOIN {} ON {}",
                dialect.alias_table(&extra.table, &extra.alias),
                extra.condition
            ));
        }
        lines.push(format!("WHERE {}", self.filter));
        lines.push(format!("ORDER BY {}", self.order.to_sql(dialect)));
        let limit = dialect.limit_and_offset(self.limit, self.offset);
        if !limit.is_empty() {
            lines.push(limit);
        }
        lines.join("\n")
    }

    /// The complete fragment: standalone `FROM (...) alias`, or the
    /// dialect's correlated attachment when `options.join` is set.
    pub fn to_sql(&self, dialect: Dialect, options: &PageOptions) -> String {
        let body = self.body(dialect, options);
        match &options.join {
            Some(join) => {
                LateralJoin::new(join.join_type, body, self.alias, join.condition.clone())
                    .to_sql(dialect)
            }
            None => format!("FROM (\n{}\n) {}", body, dialect.quote(self.alias)),
        }
    }
}

/// Unpaginated root: a plain derived table without the window count.
pub fn plain_derived_table(dialect: Dialect, table: &str, alias: &str, filter: &str) -> String {
    format!(
        "FROM (\nSELECT {}.*\nFROM {}\nWHERE {}\n) {}",
        dialect.quote(alias),
        dialect.alias_table(table, alias),
        filter,
        dialect.quote(alias)
    )
}
