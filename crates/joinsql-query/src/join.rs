//! JOIN clause types.

use crate::dialect::{Dialect, LateralStyle};

/// Types of SQL joins emitted by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    /// Get the SQL keyword for this join type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

/// A plain JOIN against a physical table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Type of join
    pub join_type: JoinType,
    /// Table to join, emitted verbatim
    pub table: String,
    /// Unquoted table alias
    pub alias: String,
    /// ON condition
    pub on: String,
}

impl Join {
    /// Create an INNER JOIN.
    pub fn inner(table: impl Into<String>, alias: impl Into<String>, on: impl Into<String>) -> Self {
        Self {
            join_type: JoinType::Inner,
            table: table.into(),
            alias: alias.into(),
            on: on.into(),
        }
    }

    /// Create a LEFT JOIN.
    pub fn left(table: impl Into<String>, alias: impl Into<String>, on: impl Into<String>) -> Self {
        Self {
            join_type: JoinType::Left,
            table: table.into(),
            alias: alias.into(),
            on: on.into(),
        }
    }

    /// Generate SQL for this JOIN clause.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        format!(
            "{} {} ON {}",
            self.join_type.as_str(),
            dialect.alias_table(&self.table, &self.alias),
            self.on
        )
    }
}

/// A correlated derived table attached to the enclosing statement.
///
/// The attachment keyword and whether an `ON` follows depend on the
/// dialect's [`LateralStyle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LateralJoin {
    pub join_type: JoinType,
    /// Subquery SQL, without parentheses
    pub body: String,
    /// Unquoted alias of the derived table
    pub alias: String,
    /// Trailing ON condition (ignored by `CROSS APPLY`)
    pub on: String,
}

impl LateralJoin {
    pub fn new(
        join_type: JoinType,
        body: impl Into<String>,
        alias: impl Into<String>,
        on: impl Into<String>,
    ) -> Self {
        Self {
            join_type,
            body: body.into(),
            alias: alias.into(),
            on: on.into(),
        }
    }

    /// Generate SQL for this attachment.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        let alias = dialect.quote(&self.alias);
        match dialect.lateral_style() {
            LateralStyle::JoinLateral => format!(
                "{} LATERAL (\n{}\n) {} ON {}",
                self.join_type.as_str(),
                self.body,
                alias,
                self.on
            ),
            LateralStyle::CrossApply => format!("CROSS APPLY (\n{}\n) {}", self.body, alias),
            LateralStyle::DerivedJoin => format!(
                "{} (\n{}\n) {} ON {}",
                self.join_type.as_str(),
                self.body,
                alias,
                self.on
            ),
        }
    }
}

/// Correlation of a paginated select with its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedJoin {
    pub join_type: JoinType,
    /// Structural predicate linking the relation to its parent
    pub condition: String,
}

/// The child table joined inside a junction's derived table, so child
/// filters and orderings can see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraJoin {
    pub table: String,
    pub alias: String,
    pub condition: String,
}

/// Options for a paginated select. `None` means "not applicable".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// Attach as a correlated derived table instead of a standalone one
    pub join: Option<CorrelatedJoin>,
    /// Join the child table inside the derived table
    pub extra_join: Option<ExtraJoin>,
}

impl PageOptions {
    /// Options for a correlated select.
    pub fn correlated(join_type: JoinType, condition: impl Into<String>) -> Self {
        Self {
            join: Some(CorrelatedJoin {
                join_type,
                condition: condition.into(),
            }),
            extra_join: None,
        }
    }

    /// Add an inner child join.
    pub fn with_extra_join(mut self, extra: Option<ExtraJoin>) -> Self {
        self.extra_join = extra;
        self
    }

    /// Whether the structural predicate must stay out of the body.
    pub(crate) fn uncorrelated_body(&self, dialect: Dialect) -> bool {
        self.join.is_some() && dialect.lateral_style() == LateralStyle::DerivedJoin
    }
}
