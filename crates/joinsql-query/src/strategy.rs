//! Join strategies and the per-node compiler.
//!
//! Each relation node is compiled by exactly one of five strategies, chosen
//! from the node's shape alone. The strategy awaits the node's callbacks in a
//! fixed order (structural join or batch key, junction filter, node filter,
//! then the junction-to-child join), hands the composed conditions to the
//! node's pagination mode and returns the fragments in emission order.

use crate::condition::{Conditions, resolve_filter, resolve_join};
use crate::config::CompilerConfig;
use crate::dialect::{Dialect, TEMP_TABLE};
use crate::fragment::{Fragment, FragmentKind, NodeFragments, PageInfo, PageMode};
use crate::join::{ExtraJoin, Join, JoinType, PageOptions};
use crate::keyset::keyset_paging_select;
use crate::offset::offset_paging_select;
use crate::paging::PagingSpec;
use crate::select::plain_derived_table;
use joinsql_core::{
    BatchScope, Cardinality, ConfigErrorKind, Context, Cx, Error, Hook, JoinCondition, JoinScope,
    Junction, Outcome, PredicateScope, RelationNode, Result, TraversalMode, Value,
};

macro_rules! try_outcome {
    ($e:expr) => {
        match $e {
            Outcome::Ok(v) => v,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }
    };
}

macro_rules! try_result {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(e) => return Outcome::Err(e),
        }
    };
}

/// How a relation node is attached to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinStrategy {
    Root,
    JoinedOneToMany,
    JoinedManyToMany,
    BatchedOneToMany,
    BatchedManyToMany,
}

impl JoinStrategy {
    /// Select the strategy for a node. Pure function of the node's shape.
    ///
    /// Cardinality and traversal mode pick the strategy; conflicting link
    /// declarations are rejected first.
    pub fn select(node: &RelationNode, has_parent: bool) -> Result<Self> {
        let unmatched =
            |msg: &str| Error::config_for(ConfigErrorKind::UnmatchedStrategy, node.alias.clone(), msg);
        let ambiguous =
            |msg: &str| Error::config_for(ConfigErrorKind::AmbiguousStrategy, node.alias.clone(), msg);

        match &node.junction {
            Some(_) if node.sql_join.is_some() || node.sql_batch.is_some() => {
                return Err(ambiguous("junction relation also carries its own sql_join or sql_batch"));
            }
            Some(j) if j.sql_batch.is_some() && !j.sql_joins.is_empty() => {
                return Err(ambiguous("junction has both sql_joins and sql_batch"));
            }
            None if node.sql_join.is_some() && node.sql_batch.is_some() => {
                return Err(ambiguous("node has both sql_join and sql_batch"));
            }
            _ => {}
        }

        match (node.cardinality(), node.traversal_mode()) {
            (Cardinality::OneToMany, TraversalMode::Batched) => Ok(JoinStrategy::BatchedOneToMany),
            (Cardinality::ManyToMany, TraversalMode::Batched) => Ok(JoinStrategy::BatchedManyToMany),
            (Cardinality::OneToMany, TraversalMode::Joined) => {
                match (node.sql_join.is_some(), has_parent) {
                    (true, true) => Ok(JoinStrategy::JoinedOneToMany),
                    (true, false) => Err(unmatched("joined relation has no parent")),
                    (false, true) => Err(unmatched("child relation has no link to its parent")),
                    (false, false) => Ok(JoinStrategy::Root),
                }
            }
            (Cardinality::ManyToMany, TraversalMode::Joined) => {
                let joins = node.junction.as_ref().map_or(0, |j| j.sql_joins.len());
                match (joins, has_parent) {
                    (0, _) => Err(unmatched("junction has neither sql_joins nor sql_batch")),
                    (1, _) => Err(unmatched("junction needs at least two sql_joins")),
                    (_, true) => Ok(JoinStrategy::JoinedManyToMany),
                    (_, false) => Err(unmatched("joined relation has no parent")),
                }
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            JoinStrategy::Root => "root",
            JoinStrategy::JoinedOneToMany => "joined one-to-many",
            JoinStrategy::JoinedManyToMany => "joined many-to-many",
            JoinStrategy::BatchedOneToMany => "batched one-to-many",
            JoinStrategy::BatchedManyToMany => "batched many-to-many",
        }
    }
}

/// Compiles relation nodes into SQL fragments.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// Compile one relation node.
    ///
    /// `parent` is the unquoted alias of the parent relation for joined
    /// strategies. `batch` carries the parent keys for batched strategies.
    /// The node's callbacks are awaited in order; the first failure aborts
    /// the node, and cancellation is returned untouched.
    #[tracing::instrument(
        level = "debug",
        skip(self, cx, node, context, batch),
        fields(node = %node.alias, table = %node.name)
    )]
    pub async fn compile_node(
        &self,
        cx: &Cx,
        node: &RelationNode,
        parent: Option<&str>,
        context: &Context,
        batch: Option<&BatchScope>,
    ) -> Outcome<NodeFragments, Error> {
        let strategy = try_result!(JoinStrategy::select(node, parent.is_some()));
        let paging = try_result!(PagingSpec::interpret(node, &self.config));
        tracing::debug!(
            strategy = strategy.as_str(),
            paging = paging.mode_name(),
            dialect = %self.dialect(),
            "Selected join strategy"
        );

        let ncx = NodeCx {
            cx,
            dialect: self.dialect(),
            node,
            context,
        };
        let fragments = match strategy {
            JoinStrategy::Root => try_outcome!(ncx.root(&paging).await),
            JoinStrategy::JoinedOneToMany => {
                let parent = try_result!(required(parent, node, "parent alias"));
                try_outcome!(ncx.joined_one_to_many(parent, &paging).await)
            }
            JoinStrategy::JoinedManyToMany => {
                let parent = try_result!(required(parent, node, "parent alias"));
                try_outcome!(ncx.joined_many_to_many(parent, &paging).await)
            }
            JoinStrategy::BatchedOneToMany => {
                let scope = try_result!(batch_scope(batch, node));
                try_outcome!(ncx.batched_one_to_many(scope, &paging).await)
            }
            JoinStrategy::BatchedManyToMany => {
                let scope = try_result!(batch_scope(batch, node));
                try_outcome!(ncx.batched_many_to_many(scope, &paging).await)
            }
        };

        let compiled = NodeFragments {
            strategy,
            page: page_info(&paging),
            fragments,
        };
        tracing::trace!(sql = %compiled.to_sql(), "Compiled relation");
        Outcome::Ok(compiled)
    }
}

fn required<'a, T: ?Sized>(value: Option<&'a T>, node: &RelationNode, what: &str) -> Result<&'a T> {
    value.ok_or_else(|| {
        Error::config_for(
            ConfigErrorKind::UnmatchedStrategy,
            node.alias.clone(),
            format!("missing {what}"),
        )
    })
}

fn batch_scope<'a>(batch: Option<&'a BatchScope>, node: &RelationNode) -> Result<&'a BatchScope> {
    match batch {
        None => Err(Error::config_for(
            ConfigErrorKind::MissingBatchScope,
            node.alias.clone(),
            "batched relation compiled without a batch scope",
        )),
        Some(scope) if scope.is_empty() => Err(Error::config_for(
            ConfigErrorKind::EmptyBatchScope,
            node.alias.clone(),
            "batch scope is empty",
        )),
        Some(scope) => Ok(scope),
    }
}

fn page_info(paging: &PagingSpec) -> Option<PageInfo> {
    match paging {
        PagingSpec::Offset(page) => Some(PageInfo {
            mode: PageMode::Offset,
            limit: page.limit,
            offset: page.offset,
            backward: false,
        }),
        PagingSpec::Keyset(page) => Some(PageInfo {
            mode: PageMode::Keyset,
            limit: page.limit,
            offset: None,
            backward: page.backward,
        }),
        PagingSpec::Unpaginated => None,
    }
}

/// Per-node compilation state.
struct NodeCx<'a> {
    cx: &'a Cx,
    dialect: Dialect,
    node: &'a RelationNode,
    context: &'a Context,
}

impl<'a> NodeCx<'a> {
    fn alias(&self) -> &'a str {
        &self.node.alias
    }

    fn junction(&self) -> Result<&'a Junction> {
        required(self.node.junction.as_ref(), self.node, "junction")
    }

    async fn node_filter(&self) -> Outcome<Option<String>, Error> {
        let Some(filter) = &self.node.filter else {
            return Outcome::Ok(None);
        };
        let table = self.dialect.quote(self.alias());
        let scope = PredicateScope {
            table: &table,
            args: &self.node.args,
            context: self.context,
            node: self.node,
        };
        resolve_filter(self.cx, filter.as_ref(), scope, self.alias(), Hook::Filter).await
    }

    async fn junction_filter(&self, junction: &Junction) -> Outcome<Option<String>, Error> {
        let Some(filter) = &junction.filter else {
            return Outcome::Ok(None);
        };
        let table = self.dialect.quote(&junction.alias);
        let scope = PredicateScope {
            table: &table,
            args: &self.node.args,
            context: self.context,
            node: self.node,
        };
        resolve_filter(self.cx, filter.as_ref(), scope, self.alias(), Hook::JunctionFilter).await
    }

    async fn join_condition(
        &self,
        condition: &dyn JoinCondition,
        parent: &str,
        child: &str,
        hook: Hook,
    ) -> Outcome<String, Error> {
        let parent = self.dialect.quote(parent);
        let child = self.dialect.quote(child);
        let scope = JoinScope {
            parent: &parent,
            child: &child,
            args: &self.node.args,
            context: self.context,
            node: self.node,
        };
        resolve_join(self.cx, condition, scope, self.alias(), hook).await
    }

    /// Render the paginated select, or `None` for unpaginated nodes.
    fn paged(
        &self,
        table: &str,
        alias: &str,
        conditions: &Conditions,
        paging: &PagingSpec,
        options: &PageOptions,
    ) -> Option<String> {
        match paging {
            PagingSpec::Offset(page) => Some(offset_paging_select(
                self.dialect,
                table,
                conditions,
                page,
                alias,
                options,
            )),
            PagingSpec::Keyset(page) => Some(keyset_paging_select(
                self.dialect,
                table,
                conditions,
                page,
                alias,
                options,
            )),
            PagingSpec::Unpaginated => None,
        }
    }

    /// The child table joined inside a junction's derived table.
    fn extra_join(&self, condition: &str) -> Option<ExtraJoin> {
        let node = self.node;
        let needed = node.filter.is_some() || node.order_by.is_some() || node.sort_key.is_some();
        needed.then(|| ExtraJoin {
            table: node.name.clone(),
            alias: node.alias.clone(),
            condition: condition.to_string(),
        })
    }

    fn child_join(&self, on: &str) -> Fragment {
        let sql = Join::left(&self.node.name, &self.node.alias, on).to_sql(self.dialect);
        Fragment::new(FragmentKind::Join, self.alias(), sql, false)
    }

    fn values_fragment(&self, parent_key: &str, scope: &BatchScope) -> Fragment {
        let sql = self.dialect.values_table(parent_key, scope.values());
        Fragment::new(FragmentKind::Values, TEMP_TABLE, sql, false)
    }

    /// Batch-key conditions: `CAST(alias.this_key AS ..) = temp.parent_key`
    /// as the join key, and `CAST(..) IN (<scope>)` as the scope restriction
    /// for bodies that cannot see `temp`.
    fn batch_conditions(
        &self,
        alias: &str,
        this_key: &str,
        parent_key: &str,
        scope: &BatchScope,
    ) -> Conditions {
        let sample = scope.first().cloned().unwrap_or(Value::Null);
        let column = self
            .dialect
            .cast_for_comparison(&self.dialect.qualify(alias, this_key), &sample);
        let mut conds = Conditions::new();
        conds.set_join_key(format!("{column} = {}", self.dialect.temp_column(parent_key)));
        conds.set_scope(self.dialect.in_list(&column, scope.values()));
        conds
    }

    async fn root(&self, paging: &PagingSpec) -> Outcome<Vec<Fragment>, Error> {
        let mut conds = Conditions::new();
        conds.push(try_outcome!(self.node_filter().await));

        let fragment = match self.paged(
            &self.node.name,
            self.alias(),
            &conds,
            paging,
            &PageOptions::default(),
        ) {
            Some(sql) => Fragment::new(FragmentKind::Derived, self.alias(), sql, true),
            None => Fragment::new(
                FragmentKind::Derived,
                self.alias(),
                plain_derived_table(
                    self.dialect,
                    &self.node.name,
                    self.alias(),
                    &conds.render(),
                ),
                false,
            ),
        };
        Outcome::Ok(vec![fragment])
    }

    async fn joined_one_to_many(
        &self,
        parent: &str,
        paging: &PagingSpec,
    ) -> Outcome<Vec<Fragment>, Error> {
        let sql_join = try_result!(required(self.node.sql_join.as_ref(), self.node, "sql_join"));
        let on = try_outcome!(
            self.join_condition(sql_join.as_ref(), parent, self.alias(), Hook::SqlJoin)
                .await
        );
        let mut conds = Conditions::new();
        conds.set_join_key(on.clone());
        conds.push(try_outcome!(self.node_filter().await));

        let options = PageOptions::correlated(JoinType::Left, on);
        let fragment = match self.paged(&self.node.name, self.alias(), &conds, paging, &options) {
            Some(sql) => Fragment::new(FragmentKind::Lateral, self.alias(), sql, true),
            None => self.child_join(&conds.render()),
        };
        Outcome::Ok(vec![fragment])
    }

    async fn joined_many_to_many(
        &self,
        parent: &str,
        paging: &PagingSpec,
    ) -> Outcome<Vec<Fragment>, Error> {
        let junction = try_result!(self.junction());
        // Parent to junction, then junction to child. Later entries are unused.
        let (Some(to_junction), Some(to_child)) =
            (junction.sql_joins.first(), junction.sql_joins.get(1))
        else {
            return Outcome::Err(Error::config_for(
                ConfigErrorKind::UnmatchedStrategy,
                self.alias(),
                "junction needs at least two sql_joins",
            ));
        };

        let on_junction = try_outcome!(
            self.join_condition(to_junction.as_ref(), parent, &junction.alias, Hook::JunctionJoin)
                .await
        );
        let junction_filter = try_outcome!(self.junction_filter(junction).await);
        let node_filter = try_outcome!(self.node_filter().await);
        let on_child = try_outcome!(
            self.join_condition(to_child.as_ref(), &junction.alias, self.alias(), Hook::JunctionJoin)
                .await
        );

        let mut conds = Conditions::new();
        conds.set_join_key(on_junction.clone());
        conds.push(junction_filter.clone());
        conds.push(node_filter.clone());

        let options = PageOptions::correlated(JoinType::Left, on_junction.clone())
            .with_extra_join(self.extra_join(&on_child));
        let fragments = match self.paged(&junction.sql_table, &junction.alias, &conds, paging, &options) {
            Some(sql) => vec![
                Fragment::new(FragmentKind::Lateral, junction.alias.clone(), sql, true),
                self.child_join(&on_child),
            ],
            None => {
                let mut junction_conds = Conditions::new();
                junction_conds.set_join_key(on_junction);
                junction_conds.push(junction_filter);
                let mut child_conds = Conditions::new();
                child_conds.set_join_key(on_child);
                child_conds.push(node_filter);
                let junction_sql = Join::left(
                    &junction.sql_table,
                    &junction.alias,
                    junction_conds.render(),
                )
                .to_sql(self.dialect);
                vec![
                    Fragment::new(FragmentKind::Join, junction.alias.clone(), junction_sql, false),
                    self.child_join(&child_conds.render()),
                ]
            }
        };
        Outcome::Ok(fragments)
    }

    async fn batched_one_to_many(
        &self,
        scope: &BatchScope,
        paging: &PagingSpec,
    ) -> Outcome<Vec<Fragment>, Error> {
        let batch = try_result!(required(self.node.sql_batch.as_ref(), self.node, "sql_batch"));
        let mut conds = self.batch_conditions(
            self.alias(),
            &batch.this_key.name,
            &batch.parent_key.name,
            scope,
        );
        let key = conds.join_key().unwrap_or_default().to_string();
        conds.push(try_outcome!(self.node_filter().await));

        let values = self.values_fragment(&batch.parent_key.name, scope);
        let options = PageOptions::correlated(JoinType::Inner, key);
        let fragment = match self.paged(&self.node.name, self.alias(), &conds, paging, &options) {
            Some(sql) => Fragment::new(FragmentKind::Lateral, self.alias(), sql, true),
            None => {
                let sql = Join::inner(&self.node.name, self.alias(), conds.render())
                    .to_sql(self.dialect);
                Fragment::new(FragmentKind::Join, self.alias(), sql, false)
            }
        };
        Outcome::Ok(vec![values, fragment])
    }

    async fn batched_many_to_many(
        &self,
        scope: &BatchScope,
        paging: &PagingSpec,
    ) -> Outcome<Vec<Fragment>, Error> {
        let junction = try_result!(self.junction());
        let batch = try_result!(required(junction.sql_batch.as_ref(), self.node, "junction sql_batch"));
        let mut conds = self.batch_conditions(
            &junction.alias,
            &batch.this_key.name,
            &batch.parent_key.name,
            scope,
        );
        let key = conds.join_key().unwrap_or_default().to_string();

        let junction_filter = try_outcome!(self.junction_filter(junction).await);
        let node_filter = try_outcome!(self.node_filter().await);
        let on_child = try_outcome!(
            self.join_condition(batch.sql_join.as_ref(), &junction.alias, self.alias(), Hook::JunctionJoin)
                .await
        );

        conds.push(junction_filter.clone());
        conds.push(node_filter.clone());

        let values = self.values_fragment(&batch.parent_key.name, scope);
        let options = PageOptions::correlated(JoinType::Left, key.clone())
            .with_extra_join(self.extra_join(&on_child));
        let fragments = match self.paged(&junction.sql_table, &junction.alias, &conds, paging, &options) {
            Some(sql) => vec![
                values,
                Fragment::new(FragmentKind::Lateral, junction.alias.clone(), sql, true),
                self.child_join(&on_child),
            ],
            None => {
                let mut junction_conds = Conditions::new();
                junction_conds.set_join_key(key);
                junction_conds.push(junction_filter);
                let mut child_conds = Conditions::new();
                child_conds.set_join_key(on_child);
                child_conds.push(node_filter);
                let junction_sql = Join::left(
                    &junction.sql_table,
                    &junction.alias,
                    junction_conds.render(),
                )
                .to_sql(self.dialect);
                vec![
                    values,
                    Fragment::new(FragmentKind::Join, junction.alias.clone(), junction_sql, false),
                    self.child_join(&child_conds.render()),
                ]
            }
        };
        Outcome::Ok(fragments)
    }
}
