//! Choice of pagination mode for a relation.

use crate::config::CompilerConfig;
use crate::keyset::{KeysetPage, interpret_keyset};
use crate::offset::{OffsetPage, interpret_offset};
use joinsql_core::{ConfigErrorKind, Error, RelationNode, Result};

/// Pagination of one relation node. Exactly one branch applies.
#[derive(Debug, Clone, PartialEq)]
pub enum PagingSpec {
    Keyset(KeysetPage),
    Offset(OffsetPage),
    /// Neither a sort key nor an order-by: the relation is joined whole.
    Unpaginated,
}

impl PagingSpec {
    /// Interpret the node's ordering hints and arguments.
    pub fn interpret(node: &RelationNode, config: &CompilerConfig) -> Result<Self> {
        let junction = node.junction.as_ref();
        if node.has_sort_key() && node.has_order_by() {
            return Err(contradiction(node, "both a sort_key and an order_by were supplied"));
        }
        if node.sort_key.is_some() && junction.is_some_and(|j| j.sort_key.is_some()) {
            return Err(contradiction(node, "node and junction both carry a sort_key"));
        }
        if node.order_by.is_some() && junction.is_some_and(|j| j.order_by.is_some()) {
            return Err(contradiction(node, "node and junction both carry an order_by"));
        }

        if node.has_sort_key() {
            interpret_keyset(node, config).map(PagingSpec::Keyset)
        } else if node.has_order_by() {
            interpret_offset(node, config).map(PagingSpec::Offset)
        } else {
            Ok(PagingSpec::Unpaginated)
        }
    }

    /// Short mode name for logs.
    pub const fn mode_name(&self) -> &'static str {
        match self {
            PagingSpec::Keyset(_) => "keyset",
            PagingSpec::Offset(_) => "offset",
            PagingSpec::Unpaginated => "unpaginated",
        }
    }
}

fn contradiction(node: &RelationNode, message: &str) -> Error {
    Error::config_for(ConfigErrorKind::ContradictoryPaging, node.alias.clone(), message)
}
