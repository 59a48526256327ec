//! Compiled output of a relation node.

use crate::clause::Limit;
use crate::strategy::JoinStrategy;

/// Shape of one emitted fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Standalone `FROM (...) alias`
    Derived,
    /// Correlated derived table (`JOIN LATERAL`, `CROSS APPLY`, ...)
    Lateral,
    /// Batch-key temp table
    Values,
    /// Plain join against a physical table
    Join,
}

/// One SQL text fragment. Fragments are not independently executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    /// Unquoted alias the fragment's result set is bound to.
    pub alias: String,
    pub sql: String,
    /// Whether the fragment exposes the `$total` window count.
    pub paginated: bool,
}

impl Fragment {
    pub fn new(
        kind: FragmentKind,
        alias: impl Into<String>,
        sql: impl Into<String>,
        paginated: bool,
    ) -> Self {
        Self {
            kind,
            alias: alias.into(),
            sql: sql.into(),
            paginated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    Offset,
    Keyset,
}

/// Pagination facts the row-stitching side needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub mode: PageMode,
    /// Rows requested from the database (lookahead included).
    pub limit: Limit,
    pub offset: Option<u64>,
    /// Keyset page fetched in reverse; rows must be reversed.
    pub backward: bool,
}

/// Everything emitted for one relation node, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFragments {
    pub strategy: JoinStrategy,
    pub page: Option<PageInfo>,
    pub fragments: Vec<Fragment>,
}

impl NodeFragments {
    /// Fragments joined in emission order.
    pub fn to_sql(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.sql.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Accumulates compiled nodes in call order into one `FROM ...` clause.
#[derive(Debug, Clone, Default)]
pub struct TableList {
    nodes: Vec<NodeFragments>,
}

impl TableList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeFragments) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[NodeFragments] {
        &self.nodes
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.nodes.iter().flat_map(|n| n.fragments.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The composed clause text.
    pub fn to_sql(&self) -> String {
        self.fragments()
            .map(|f| f.sql.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Extend<NodeFragments> for TableList {
    fn extend<I: IntoIterator<Item = NodeFragments>>(&mut self, iter: I) {
        self.nodes.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_list_keeps_call_order() {
        let root = NodeFragments {
            strategy: JoinStrategy::Root,
            page: None,
            fragments: vec![Fragment::new(FragmentKind::Derived, "u", "FROM users AS \"u\"", false)],
        };
        let child = NodeFragments {
            strategy: JoinStrategy::JoinedOneToMany,
            page: None,
            fragments: vec![Fragment::new(
                FragmentKind::Join,
                "p",
                "LEFT JOIN posts AS \"p\" ON \"u\".\"id\" = \"p\".\"user_id\"",
                false,
            )],
        };
        let mut tables = TableList::new();
        tables.push(root);
        tables.extend([child]);
        assert_eq!(tables.nodes().len(), 2);
        assert_eq!(
            tables.to_sql(),
            "FROM users AS \"u\"\nLEFT JOIN posts AS \"p\" ON \"u\".\"id\" = \"p\".\"user_id\""
        );
    }
}
