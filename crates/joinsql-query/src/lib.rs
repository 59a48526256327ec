//! Pagination and join-strategy SQL compiler for joinsql.
//!
//! `joinsql-query` is the **compilation layer**. Given one relation node of a
//! nested query tree, it picks the join strategy, interprets the node's
//! pagination arguments and emits the dialect-specific SQL fragments that
//! attach the node to its parent.
//!
//! # Role In The Architecture
//!
//! - **Strategies**: [`JoinStrategy`] and [`Compiler`] turn a node into fragments.
//! - **Pagination**: offset windows and keyset seeks, both counted with a
//!   `$total` window column.
//! - **Dialects**: Postgres, Oracle, MySQL, MariaDB, SQLite and SQL Server.
//! - **Cursors**: opaque base64 JSON cursors for keyset paging.
//!
//! Callers walk their relation tree, call [`Compiler::compile_node`] once per
//! node and collect the output in a [`TableList`].

pub mod cast;
pub mod clause;
pub mod condition;
pub mod config;
pub mod cursor;
pub mod dialect;
pub mod fragment;
pub mod join;
pub mod keyset;
pub mod offset;
pub mod paging;
pub mod select;
pub mod strategy;

pub use cast::{cast_for_comparison, cast_type};
pub use clause::{Limit, Order, OrderBy};
pub use condition::Conditions;
pub use config::{CompilerConfig, UnboundedPage};
pub use cursor::{Cursor, cursor_to_offset, offset_to_cursor};
pub use dialect::{Dialect, LateralStyle, TEMP_TABLE, TOTAL_COLUMN};
pub use fragment::{Fragment, FragmentKind, NodeFragments, PageInfo, PageMode, TableList};
pub use join::{CorrelatedJoin, ExtraJoin, Join, JoinType, LateralJoin, PageOptions};
pub use keyset::{KeysetPage, SeekPredicate, interpret_keyset, keyset_paging_select};
pub use offset::{OffsetPage, interpret_offset, offset_paging_select};
pub use paging::PagingSpec;
pub use select::{PagedSelect, plain_derived_table};
pub use strategy::{Compiler, JoinStrategy};
