//! Relation-node model.
//!
//! A [`RelationNode`] describes one relation of a traversal tree: the table
//! to read, its alias, the pagination arguments the caller received, and the
//! callbacks and link metadata that tie it to its parent. Nodes are built
//! fresh per request by the traversal layer and discarded once the SQL is
//! emitted.

use crate::Value;
use crate::predicate::{JoinCondition, Predicate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A column identifier on the relevant table or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Sort direction of one ordering column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    pub const fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// One `(column, direction)` entry of an `order_by` or `sort_key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderColumn {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderColumn {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Ascending order on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Asc)
    }

    /// Descending order on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Desc)
    }
}

/// Pagination and filter arguments supplied by the caller for one relation.
///
/// `first`/`after` page forward, `last`/`before` page backward. Anything
/// else the caller wants its callbacks to see goes in `filters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Args {
    pub first: Option<u64>,
    pub last: Option<u64>,
    pub after: Option<String>,
    pub before: Option<String>,
    #[serde(flatten)]
    pub filters: BTreeMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn first(mut self, n: u64) -> Self {
        self.first = Some(n);
        self
    }

    #[must_use]
    pub fn last(mut self, n: u64) -> Self {
        self.last = Some(n);
        self
    }

    #[must_use]
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    #[must_use]
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    /// Attach a free-form argument for the node's callbacks.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Look up a free-form argument.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.filters.get(key)
    }
}

/// Batch keys of a one-to-many relation resolved for many parents at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlBatch {
    /// Foreign key on this node's table.
    pub this_key: ColumnRef,
    /// Key of the parent rows the batch scope is made of.
    pub parent_key: ColumnRef,
}

impl SqlBatch {
    pub fn new(this_key: impl Into<String>, parent_key: impl Into<String>) -> Self {
        Self {
            this_key: ColumnRef::new(this_key),
            parent_key: ColumnRef::new(parent_key),
        }
    }
}

/// Batch keys of a many-to-many relation, keyed through the junction table.
#[derive(Clone)]
pub struct JunctionBatch {
    /// Key on the junction table matching the parent rows.
    pub this_key: ColumnRef,
    /// Key of the parent rows the batch scope is made of.
    pub parent_key: ColumnRef,
    /// Junction-to-child join condition.
    pub sql_join: Arc<dyn JoinCondition>,
}

impl JunctionBatch {
    pub fn new(
        this_key: impl Into<String>,
        parent_key: impl Into<String>,
        sql_join: Arc<dyn JoinCondition>,
    ) -> Self {
        Self {
            this_key: ColumnRef::new(this_key),
            parent_key: ColumnRef::new(parent_key),
            sql_join,
        }
    }
}

impl fmt::Debug for JunctionBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JunctionBatch")
            .field("this_key", &self.this_key)
            .field("parent_key", &self.parent_key)
            .finish_non_exhaustive()
    }
}

/// The intermediate table of a many-to-many relation.
#[derive(Clone)]
pub struct Junction {
    /// Junction table, emitted verbatim.
    pub sql_table: String,
    /// Unique alias of the junction table.
    pub alias: String,
    pub filter: Option<Arc<dyn Predicate>>,
    pub order_by: Option<Vec<OrderColumn>>,
    pub sort_key: Option<Vec<OrderColumn>>,
    /// Parent-to-junction then junction-to-child join conditions.
    pub sql_joins: Vec<Arc<dyn JoinCondition>>,
    pub sql_batch: Option<JunctionBatch>,
}

impl Junction {
    pub fn new(sql_table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            sql_table: sql_table.into(),
            alias: alias.into(),
            filter: None,
            order_by: None,
            sort_key: None,
            sql_joins: Vec::new(),
            sql_batch: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, predicate: Arc<dyn Predicate>) -> Self {
        self.filter = Some(predicate);
        self
    }

    #[must_use]
    pub fn order_by(mut self, columns: Vec<OrderColumn>) -> Self {
        self.order_by = Some(columns);
        self
    }

    #[must_use]
    pub fn sort_key(mut self, columns: Vec<OrderColumn>) -> Self {
        self.sort_key = Some(columns);
        self
    }

    /// Set the parent-to-junction and junction-to-child join conditions.
    #[must_use]
    pub fn joins(
        mut self,
        to_junction: Arc<dyn JoinCondition>,
        to_child: Arc<dyn JoinCondition>,
    ) -> Self {
        self.sql_joins = vec![to_junction, to_child];
        self
    }

    /// Append one join condition.
    #[must_use]
    pub fn join(mut self, condition: Arc<dyn JoinCondition>) -> Self {
        self.sql_joins.push(condition);
        self
    }

    #[must_use]
    pub fn batch(mut self, batch: JunctionBatch) -> Self {
        self.sql_batch = Some(batch);
        self
    }
}

impl fmt::Debug for Junction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Junction")
            .field("sql_table", &self.sql_table)
            .field("alias", &self.alias)
            .field("filter", &self.filter.is_some())
            .field("order_by", &self.order_by)
            .field("sort_key", &self.sort_key)
            .field("sql_joins", &self.sql_joins.len())
            .field("sql_batch", &self.sql_batch)
            .finish()
    }
}

/// Cardinality of a relation as seen from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneToMany,
    ManyToMany,
}

/// How a relation is resolved relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    /// Joined into the parent's statement.
    Joined,
    /// Resolved for a batch of parent keys in a separate statement.
    Batched,
}

/// One relation of the traversal tree.
#[derive(Clone)]
pub struct RelationNode {
    /// Physical table, emitted verbatim.
    pub name: String,
    /// Unique alias; every fragment of this node is aliased to it.
    pub alias: String,
    pub args: Args,
    pub filter: Option<Arc<dyn Predicate>>,
    pub sql_join: Option<Arc<dyn JoinCondition>>,
    pub order_by: Option<Vec<OrderColumn>>,
    pub sort_key: Option<Vec<OrderColumn>>,
    pub junction: Option<Junction>,
    pub sql_batch: Option<SqlBatch>,
}

impl RelationNode {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            args: Args::default(),
            filter: None,
            sql_join: None,
            order_by: None,
            sort_key: None,
            junction: None,
            sql_batch: None,
        }
    }

    #[must_use]
    pub fn args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: Arc<dyn Predicate>) -> Self {
        self.filter = Some(predicate);
        self
    }

    #[must_use]
    pub fn sql_join(mut self, condition: Arc<dyn JoinCondition>) -> Self {
        self.sql_join = Some(condition);
        self
    }

    #[must_use]
    pub fn order_by(mut self, columns: Vec<OrderColumn>) -> Self {
        self.order_by = Some(columns);
        self
    }

    #[must_use]
    pub fn sort_key(mut self, columns: Vec<OrderColumn>) -> Self {
        self.sort_key = Some(columns);
        self
    }

    #[must_use]
    pub fn junction(mut self, junction: Junction) -> Self {
        self.junction = Some(junction);
        self
    }

    #[must_use]
    pub fn sql_batch(mut self, batch: SqlBatch) -> Self {
        self.sql_batch = Some(batch);
        self
    }

    /// Cardinality implied by the presence of a junction.
    pub fn cardinality(&self) -> Cardinality {
        if self.junction.is_some() {
            Cardinality::ManyToMany
        } else {
            Cardinality::OneToMany
        }
    }

    /// Traversal mode implied by the presence of batch keys.
    pub fn traversal_mode(&self) -> TraversalMode {
        let junction_batched = self
            .junction
            .as_ref()
            .is_some_and(|j| j.sql_batch.is_some());
        if self.sql_batch.is_some() || junction_batched {
            TraversalMode::Batched
        } else {
            TraversalMode::Joined
        }
    }

    /// Does this node or its junction carry a keyset sort key?
    pub fn has_sort_key(&self) -> bool {
        self.sort_key.is_some() || self.junction.as_ref().is_some_and(|j| j.sort_key.is_some())
    }

    /// Does this node or its junction carry an offset order-by?
    pub fn has_order_by(&self) -> bool {
        self.order_by.is_some() || self.junction.as_ref().is_some_and(|j| j.order_by.is_some())
    }
}

impl fmt::Debug for RelationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationNode")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("args", &self.args)
            .field("filter", &self.filter.is_some())
            .field("sql_join", &self.sql_join.is_some())
            .field("order_by", &self.order_by)
            .field("sort_key", &self.sort_key)
            .field("junction", &self.junction)
            .field("sql_batch", &self.sql_batch)
            .finish()
    }
}

/// Parent-key values a batched relation is resolved for in one pass.
///
/// The first value decides the cast applied to the batched foreign key, so
/// every value is expected to share its runtime type. Mixed scopes are not
/// rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchScope {
    values: Vec<Value>,
}

impl BatchScope {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The type sample used for the batch-key cast.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<V: Into<Value>> FromIterator<V> for BatchScope {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join_fn;

    #[test]
    fn cardinality_and_mode_follow_shape() {
        let plain = RelationNode::new("posts", "p");
        assert_eq!(plain.cardinality(), Cardinality::OneToMany);
        assert_eq!(plain.traversal_mode(), TraversalMode::Joined);

        let batched = RelationNode::new("posts", "p").sql_batch(SqlBatch::new("user_id", "id"));
        assert_eq!(batched.traversal_mode(), TraversalMode::Batched);

        let on = join_fn(|s| format!("{}.tag_id = {}.id", s.parent, s.child));
        let m2m = RelationNode::new("tags", "t").junction(
            Junction::new("post_tags", "pt").batch(JunctionBatch::new("post_id", "id", on)),
        );
        assert_eq!(m2m.cardinality(), Cardinality::ManyToMany);
        assert_eq!(m2m.traversal_mode(), TraversalMode::Batched);
    }

    #[test]
    fn paging_hints_include_junction() {
        let node = RelationNode::new("tags", "t")
            .junction(Junction::new("post_tags", "pt").sort_key(vec![OrderColumn::asc("id")]));
        assert!(node.has_sort_key());
        assert!(!node.has_order_by());
    }

    #[test]
    fn args_deserialize_with_free_form_filters() {
        let args: Args =
            serde_json::from_str(r#"{"first": 5, "after": "abc", "status": {"Text": "open"}}"#)
                .unwrap();
        assert_eq!(args.first, Some(5));
        assert_eq!(args.after.as_deref(), Some("abc"));
        assert_eq!(args.get("status"), Some(&Value::Text("open".to_string())));
        assert_eq!(args.last, None);
    }

    #[test]
    fn sort_direction_serializes_uppercase() {
        let col = OrderColumn::desc("created_at");
        let json = serde_json::to_string(&col).unwrap();
        assert_eq!(json, r#"{"column":"created_at","direction":"DESC"}"#);
        assert_eq!(SortDirection::Desc.reverse(), SortDirection::Asc);
    }

    #[test]
    fn batch_scope_collects_values() {
        let scope: BatchScope = [1_i64, 2, 3].into_iter().collect();
        assert_eq!(scope.len(), 3);
        assert_eq!(scope.first(), Some(&Value::BigInt(1)));
        assert!(BatchScope::default().is_empty());
    }
}
