//! Core types and traits for joinsql.
//!
//! This crate provides the foundational abstractions shared by the compiler:
//!
//! - `RelationNode` and friends describing one relation of a traversal tree
//! - `Predicate` / `JoinCondition` for user-supplied SQL callbacks
//! - `Value` for batch keys, cursor tuples and literals
//! - `Error` with configuration, cursor and callback categories
//! - `Outcome` and `Cx` re-exported from asupersync for cancel-correct callbacks

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod error;
pub mod identifiers;
pub mod node;
pub mod predicate;
pub mod value;

pub use error::{
    CallbackError, ConfigError, ConfigErrorKind, CursorError, CursorErrorKind, Error, Hook, Result,
};
pub use identifiers::{quote_ident, quote_ident_mssql, quote_ident_mysql};
pub use node::{
    Args, BatchScope, Cardinality, ColumnRef, Junction, JunctionBatch, OrderColumn, RelationNode,
    SortDirection, SqlBatch, TraversalMode,
};
pub use predicate::{
    BoxFuture, Context, JoinCondition, JoinScope, Predicate, PredicateScope, filter_async,
    filter_fn, join_async, join_fn,
};
pub use value::{Value, ValueKind};
