//! Whole-tree compilation.
//!
//! A [`RelationTree`] is walked depth-first. Every joined relation is compiled
//! into one [`TableList`] in parent-before-child order. Batched relations
//! cannot be compiled until their parent rows have been fetched, so they are
//! returned as [`DeferredBatch`] entries for the caller to compile with a
//! [`BatchScope`] built from those rows.
//!
//! ```rust,ignore
//! use joinsql::prelude::*;
//!
//! let tree = RelationTree::new(users).child(RelationTree::new(posts));
//! let compiled = compile_tree(cx, &compiler, &tree, &(), None).await;
//! ```

use joinsql_core::{BatchScope, Context, Cx, Error, Outcome, RelationNode, TraversalMode};
use joinsql_query::{Compiler, TableList};

/// A relation node and the relations nested under it.
#[derive(Debug, Clone)]
pub struct RelationTree {
    pub node: RelationNode,
    pub children: Vec<RelationTree>,
}

impl RelationTree {
    pub fn new(node: RelationNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn child(mut self, child: RelationTree) -> Self {
        self.children.push(child);
        self
    }

    /// Number of relations in the tree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(RelationTree::node_count)
            .sum::<usize>()
    }
}

/// A batched relation left for a follow-up query.
#[derive(Debug, Clone, Copy)]
pub struct DeferredBatch<'a> {
    /// Alias of the relation whose rows provide the batch scope.
    pub parent: &'a str,
    pub tree: &'a RelationTree,
}

/// Output of [`compile_tree`].
#[derive(Debug, Clone)]
pub struct CompiledTree<'a> {
    pub tables: TableList,
    /// Batched subtrees, in the order they were reached.
    pub deferred: Vec<DeferredBatch<'a>>,
}

/// Compile `tree` and every joined relation beneath it.
///
/// `batch` is the scope of the root when the root itself is batched, as when
/// compiling a [`DeferredBatch`]. Batched descendants are not descended into.
pub async fn compile_tree<'a>(
    cx: &Cx,
    compiler: &Compiler,
    tree: &'a RelationTree,
    context: &Context,
    batch: Option<&BatchScope>,
) -> Outcome<CompiledTree<'a>, Error> {
    let mut tables = TableList::new();
    let mut deferred = Vec::new();
    let mut stack: Vec<(&'a RelationTree, Option<&'a str>)> = vec![(tree, None)];

    while let Some((current, parent)) = stack.pop() {
        let is_root = std::ptr::eq(current, tree);
        if !is_root && current.node.traversal_mode() == TraversalMode::Batched {
            if let Some(parent) = parent {
                deferred.push(DeferredBatch {
                    parent,
                    tree: current,
                });
            }
            continue;
        }

        let scope = if is_root { batch } else { None };
        let compiled = match compiler
            .compile_node(cx, &current.node, parent, context, scope)
            .await
        {
            Outcome::Ok(compiled) => compiled,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        tables.push(compiled);

        let alias = current.node.alias.as_str();
        for child in current.children.iter().rev() {
            stack.push((child, Some(alias)));
        }
    }

    tracing::debug!(
        nodes = tables.nodes().len(),
        deferred = deferred.len(),
        "Compiled relation tree"
    );
    Outcome::Ok(CompiledTree { tables, deferred })
}
