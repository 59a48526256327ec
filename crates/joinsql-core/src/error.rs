//! Error types for relation compilation.

use std::fmt;

/// The primary error type for all joinsql operations.
#[derive(Debug)]
pub enum Error {
    /// Invalid node shape, dialect or pagination hints (fatal, never retried)
    Config(ConfigError),
    /// Malformed cursor or cursor/sort-key mismatch
    Cursor(CursorError),
    /// A user-supplied `filter`/`sql_join` callback failed
    Callback(CallbackError),
    /// Serialization/deserialization errors
    Serde(String),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
    /// Alias of the relation node being compiled, when known.
    pub node: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// Dialect name not recognized
    UnknownDialect,
    /// Node shape fits none of the join strategies
    UnmatchedStrategy,
    /// Node shape carries hints for more than one join strategy
    AmbiguousStrategy,
    /// Batched relation compiled with an empty batch scope
    EmptyBatchScope,
    /// Batched relation compiled without any batch scope
    MissingBatchScope,
    /// Both a sort key and an order-by were supplied
    ContradictoryPaging,
    /// Pagination arguments that cannot be honored (e.g. `last` with offsets)
    InvalidPagination,
}

#[derive(Debug)]
pub struct CursorError {
    pub kind: CursorErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorErrorKind {
    /// Not valid base64, UTF-8 or JSON, or not the expected shape
    Malformed,
    /// Cursor carries a column the sort key does not have
    UnknownColumn,
    /// Sort key column absent from the cursor
    MissingColumn,
    /// Value with no JSON form (NaN or an infinite float)
    NonFinite,
}

/// Which callback of a relation node failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// The node's own `filter` predicate
    Filter,
    /// The node's parent-to-child `sql_join` condition
    SqlJoin,
    /// The junction's `filter` predicate
    JunctionFilter,
    /// One of the junction's join conditions
    JunctionJoin,
}

impl Hook {
    pub const fn as_str(self) -> &'static str {
        match self {
            Hook::Filter => "filter",
            Hook::SqlJoin => "sql_join",
            Hook::JunctionFilter => "junction filter",
            Hook::JunctionJoin => "junction join",
        }
    }
}

/// A callback failure, carrying the node identity for diagnostics.
///
/// The callback's own error is kept verbatim in `source`.
#[derive(Debug)]
pub struct CallbackError {
    pub node: String,
    pub hook: Hook,
    pub source: Box<Error>,
}

impl Error {
    /// Build a configuration error without node identity.
    pub fn config(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Error::Config(ConfigError {
            kind,
            message: message.into(),
            node: None,
        })
    }

    /// Build a configuration error attributed to a relation node.
    pub fn config_for(
        kind: ConfigErrorKind,
        node: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Config(ConfigError {
            kind,
            message: message.into(),
            node: Some(node.into()),
        })
    }

    /// Build a cursor error.
    pub fn cursor(kind: CursorErrorKind, message: impl Into<String>) -> Self {
        Error::Cursor(CursorError {
            kind,
            message: message.into(),
        })
    }

    /// Wrap a callback failure with the node identity.
    pub fn callback(node: impl Into<String>, hook: Hook, source: Error) -> Self {
        Error::Callback(CallbackError {
            node: node.into(),
            hook,
            source: Box::new(source),
        })
    }

    /// Kind of the configuration error, if this is one.
    pub fn config_kind(&self) -> Option<ConfigErrorKind> {
        match self {
            Error::Config(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Kind of the cursor error, if this is one.
    pub fn cursor_kind(&self) -> Option<CursorErrorKind> {
        match self {
            Error::Cursor(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Is this error fatal for the whole request rather than a single node?
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Cursor(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Cursor(e) => write!(f, "Cursor error: {}", e),
            Error::Callback(e) => write!(f, "Callback error: {}", e),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Callback(e) => Some(e.source.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(node) = &self.node {
            write!(f, "{} (node '{}')", self.message, node)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} callback of node '{}' failed: {}",
            self.hook.as_str(),
            self.node,
            self.source
        )
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<CursorError> for Error {
    fn from(err: CursorError) -> Self {
        Error::Cursor(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for joinsql operations.
pub type Result<T> = std::result::Result<T, Error>;
