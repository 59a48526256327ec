//! joinsql - compile nested, paginated relation traversals into SQL.
//!
//! A relation tree describes a root table and the relations nested under it,
//! each with optional pagination and user-supplied SQL callbacks. joinsql
//! compiles every relation into SQL fragments that attach it to its parent:
//!
//! - One-to-many and many-to-many relations, joined or batched
//! - Offset and keyset pagination with a `$total` window count
//! - Postgres, Oracle, MySQL, MariaDB, SQLite and SQL Server dialects
//! - Asynchronous, cancel-correct callbacks driven by asupersync
//!
//! # Quick Start
//!
//! ```ignore
//! use joinsql::prelude::*;
//!
//! async fn users_with_posts(cx: &Cx) -> Outcome<String, Error> {
//!     let users = RelationNode::new("users", "u")
//!         .order_by(vec![OrderColumn::asc("id")])
//!         .args(Args::new().first(10));
//!     let posts = RelationNode::new("posts", "p")
//!         .sql_join(join_fn(|s| format!("{}.id = {}.user_id", s.parent, s.child)))
//!         .sort_key(vec![OrderColumn::desc("created_at"), OrderColumn::desc("id")])
//!         .args(Args::new().first(5));
//!     let tree = RelationTree::new(users).child(RelationTree::new(posts));
//!
//!     let compiler = Compiler::new(CompilerConfig::new(Dialect::Postgres));
//!     match compile_tree(cx, &compiler, &tree, &(), None).await {
//!         Outcome::Ok(compiled) => Outcome::Ok(compiled.tables.to_sql()),
//!         Outcome::Err(e) => Outcome::Err(e),
//!         Outcome::Cancelled(r) => Outcome::Cancelled(r),
//!         Outcome::Panicked(p) => Outcome::Panicked(p),
//!     }
//! }
//! ```
//!
//! # Crates
//!
//! - `joinsql-core`: relation nodes, callbacks, values and errors
//! - `joinsql-query`: dialects, pagination and join strategies
//! - `joinsql`: this facade, plus whole-tree compilation

pub mod tree;

pub use tree::{CompiledTree, DeferredBatch, RelationTree, compile_tree};

pub use joinsql_core::{
    Args, BatchScope, BoxFuture, CallbackError, Cardinality, ColumnRef, ConfigError,
    ConfigErrorKind, Context, CursorError, CursorErrorKind, Cx, Error, Hook, JoinCondition,
    JoinScope, Junction, JunctionBatch, OrderColumn, Outcome, Predicate, PredicateScope,
    RelationNode, Result, SortDirection, SqlBatch, TraversalMode, Value, ValueKind, filter_async,
    filter_fn, join_async, join_fn, quote_ident,
};

pub use joinsql_query::{
    Compiler, CompilerConfig, Cursor, Dialect, Fragment, FragmentKind, JoinStrategy, Limit,
    NodeFragments, PageInfo, PageMode, SeekPredicate, TableList, UnboundedPage, cursor_to_offset,
    offset_to_cursor,
};

/// Everything needed to describe and compile a relation tree.
pub mod prelude {
    pub use crate::{
        // asupersync
        Cx,
        Outcome,
        // Data model
        Args,
        BatchScope,
        Junction,
        JunctionBatch,
        OrderColumn,
        RelationNode,
        RelationTree,
        SqlBatch,
        Value,
        // Callbacks
        filter_async,
        filter_fn,
        join_async,
        join_fn,
        // Compilation
        Compiler,
        CompilerConfig,
        Cursor,
        Dialect,
        Error,
        NodeFragments,
        Result,
        TableList,
        compile_tree,
    };
}
