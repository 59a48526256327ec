//! Compiler configuration.

use crate::clause::Limit;
use crate::dialect::Dialect;
use joinsql_core::{ConfigErrorKind, Error, Result};

/// What to do with a paginated relation that requested no page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnboundedPage {
    /// Fetch every row (`LIMIT ALL` or the dialect's equivalent)
    #[default]
    All,
    /// Use this page size, and cap larger requests to it
    Max(u64),
    /// Fail with a configuration error
    Reject,
}

/// Compiler configuration.
#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    /// Target dialect
    pub dialect: Dialect,
    /// Policy for pages without `first`/`last`
    pub unbounded: UnboundedPage,
    /// Fetch one row past the page so callers can detect a next page
    pub lookahead: bool,
}

impl CompilerConfig {
    /// Create a configuration for the given dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Create a configuration from a dialect name such as `"pg"` or `"mssql"`.
    pub fn for_dialect_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    /// Set the dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the unbounded page policy.
    pub fn unbounded(mut self, policy: UnboundedPage) -> Self {
        self.unbounded = policy;
        self
    }

    /// Enable or disable the lookahead row.
    pub fn lookahead(mut self, enabled: bool) -> Self {
        self.lookahead = enabled;
        self
    }

    /// Effective limit for a requested page size.
    pub(crate) fn page_limit(&self, requested: Option<u64>, node: &str) -> Result<Limit> {
        let limit = match (requested, self.unbounded) {
            (Some(n), UnboundedPage::Max(max)) => Limit::Rows(n.min(max)),
            (Some(n), _) => Limit::Rows(n),
            (None, UnboundedPage::All) => Limit::All,
            (None, UnboundedPage::Max(max)) => Limit::Rows(max),
            (None, UnboundedPage::Reject) => {
                return Err(Error::config_for(
                    ConfigErrorKind::InvalidPagination,
                    node,
                    "paginated relation requires `first` or `last`",
                ));
            }
        };
        Ok(if self.lookahead { limit.plus_one() } else { limit })
    }
}
