//! Offset pagination.
//!
//! Pages are addressed by position: `first` is the page size and the `after`
//! offset cursor names the last row already seen. Paging backward is not
//! supported.

use crate::clause::{Limit, Order};
use crate::condition::Conditions;
use crate::config::CompilerConfig;
use crate::cursor::cursor_to_offset;
use crate::dialect::Dialect;
use crate::join::PageOptions;
use crate::select::PagedSelect;
use joinsql_core::{ConfigErrorKind, Error, RelationNode, Result};

/// An interpreted offset page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPage {
    pub limit: Limit,
    pub offset: Option<u64>,
    pub order: Order,
}

/// Interpret a node's arguments for offset pagination.
///
/// The order comes from the node's `order_by`, else from its junction's.
pub fn interpret_offset(node: &RelationNode, config: &CompilerConfig) -> Result<OffsetPage> {
    let order = if let Some(columns) = &node.order_by {
        Order::new(node.alias.clone(), columns.clone())
    } else if let Some(junction) = node.junction.as_ref().filter(|j| j.order_by.is_some()) {
        Order::new(
            junction.alias.clone(),
            junction.order_by.clone().unwrap_or_default(),
        )
    } else {
        return Err(Error::config_for(
            ConfigErrorKind::InvalidPagination,
            node.alias.clone(),
            "offset pagination requires an order_by",
        ));
    };

    let args = &node.args;
    if args.last.is_some() || args.before.is_some() {
        return Err(Error::config_for(
            ConfigErrorKind::InvalidPagination,
            node.alias.clone(),
            "`last` and `before` are not supported with offset pagination",
        ));
    }

    let limit = config.page_limit(args.first, &node.alias)?;
    let offset = match &args.after {
        Some(cursor) => Some(cursor_to_offset(cursor)?.saturating_add(1)),
        None => None,
    };

    Ok(OffsetPage {
        limit,
        offset,
        order,
    })
}

/// Render an offset-paginated select.
pub fn offset_paging_select(
    dialect: Dialect,
    table: &str,
    conditions: &Conditions,
    page: &OffsetPage,
    alias: &str,
    options: &PageOptions,
) -> String {
    let filter = if options.uncorrelated_body(dialect) {
        conditions.render_uncorrelated()
    } else {
        conditions.render()
    };
    PagedSelect {
        table,
        alias,
        filter,
        order: &page.order,
        limit: page.limit,
        offset: page.offset,
    }
    .to_sql(dialect, options)
}
