//! SQL clause types (ORDER BY, LIMIT, OFFSET).

use crate::dialect::Dialect;
use joinsql_core::{OrderColumn, SortDirection};

/// ORDER BY entry qualified by a table alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    table: String,
    column: String,
    direction: SortDirection,
}

impl OrderBy {
    /// Create an ascending order by entry.
    pub fn asc(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(table, column, SortDirection::Asc)
    }

    /// Create a descending order by entry.
    pub fn desc(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(table, column, SortDirection::Desc)
    }

    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        direction: SortDirection,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            direction,
        }
    }

    /// Generate SQL for this entry, e.g. `"p"."id" DESC`.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        format!(
            "{} {}",
            dialect.qualify(&self.table, &self.column),
            self.direction.as_str()
        )
    }
}

/// The ordered column list of a paginated select, bound to one table alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Unquoted alias the columns belong to.
    pub table: String,
    /// Columns with their effective directions.
    pub columns: Vec<OrderColumn>,
}

impl Order {
    pub fn new(table: impl Into<String>, columns: Vec<OrderColumn>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// The same order with every direction flipped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            table: self.table.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| OrderColumn::new(c.column.clone(), c.direction.reverse()))
                .collect(),
        }
    }

    /// Entries ready for rendering.
    pub fn entries(&self) -> impl Iterator<Item = OrderBy> + '_ {
        self.columns
            .iter()
            .map(|c| OrderBy::new(self.table.clone(), c.column.clone(), c.direction))
    }

    /// Generate the comma-separated ORDER BY list (without the keyword).
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.entries()
            .map(|e| e.to_sql(dialect))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// LIMIT clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// No upper bound on the page size.
    All,
    /// At most this many rows.
    Rows(u64),
}

impl Limit {
    /// Row count, if bounded.
    pub const fn rows(self) -> Option<u64> {
        match self {
            Limit::All => None,
            Limit::Rows(n) => Some(n),
        }
    }

    /// One more row than requested, for next-page detection.
    #[must_use]
    pub const fn plus_one(self) -> Self {
        match self {
            Limit::All => Limit::All,
            Limit::Rows(n) => Limit::Rows(n.saturating_add(1)),
        }
    }
}
