//! WHERE-list composition and callback resolution.

use crate::dialect::TAUTOLOGY;
use joinsql_core::{
    Cx, Error, Hook, JoinCondition, JoinScope, Outcome, Predicate, PredicateScope,
};

/// The WHERE list of one paginated select.
///
/// The structural join/batch-key predicate, when present, is kept apart from
/// the filter predicates so dialects whose derived tables cannot be
/// correlated can move it into the trailing `ON`. A batched relation also
/// carries an uncorrelated scope restriction that takes the key's place in
/// such bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    join_key: Option<String>,
    scope: Option<String>,
    predicates: Vec<String>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the structural predicate linking the relation to its parent.
    pub fn set_join_key(&mut self, sql: impl Into<String>) {
        let sql = sql.into();
        self.join_key = if sql.trim().is_empty() { None } else { Some(sql) };
    }

    /// Set the restriction to the batch scope used when the body cannot see
    /// the batch-key table.
    pub fn set_scope(&mut self, sql: impl Into<String>) {
        let sql = sql.into();
        self.scope = if sql.trim().is_empty() { None } else { Some(sql) };
    }

    /// Append a predicate; empty results are dropped.
    pub fn push(&mut self, sql: Option<String>) {
        if let Some(sql) = sql.filter(|s| !s.trim().is_empty()) {
            self.predicates.push(sql);
        }
    }

    pub fn join_key(&self) -> Option<&str> {
        self.join_key.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.join_key.is_none() && self.predicates.is_empty()
    }

    /// All conditions joined with `AND`, or the tautology.
    pub fn render(&self) -> String {
        let all: Vec<&str> = self
            .join_key
            .iter()
            .map(String::as_str)
            .chain(self.predicates.iter().map(String::as_str))
            .collect();
        join_and(&all)
    }

    /// The scope restriction and filter predicates, without the structural
    /// predicate.
    pub fn render_uncorrelated(&self) -> String {
        let preds: Vec<&str> = self
            .scope
            .iter()
            .map(String::as_str)
            .chain(self.predicates.iter().map(String::as_str))
            .collect();
        join_and(&preds)
    }
}

fn join_and(parts: &[&str]) -> String {
    if parts.is_empty() {
        TAUTOLOGY.to_string()
    } else {
        parts.join(" AND ")
    }
}

/// Await a `filter` predicate, attributing failures to `node`.
pub(crate) async fn resolve_filter(
    cx: &Cx,
    predicate: &dyn Predicate,
    scope: PredicateScope<'_>,
    node: &str,
    hook: Hook,
) -> Outcome<Option<String>, Error> {
    match predicate.render(cx, scope).await {
        Outcome::Ok(sql) => Outcome::Ok(sql),
        Outcome::Err(e) => Outcome::Err(Error::callback(node, hook, e)),
        Outcome::Cancelled(r) => Outcome::Cancelled(r),
        Outcome::Panicked(p) => Outcome::Panicked(p),
    }
}

/// Await a join condition, attributing failures to `node`.
pub(crate) async fn resolve_join(
    cx: &Cx,
    condition: &dyn JoinCondition,
    scope: JoinScope<'_>,
    node: &str,
    hook: Hook,
) -> Outcome<String, Error> {
    match condition.render(cx, scope).await {
        Outcome::Ok(sql) => Outcome::Ok(sql),
        Outcome::Err(e) => Outcome::Err(Error::callback(node, hook, e)),
        Outcome::Cancelled(r) => Outcome::Cancelled(r),
        Outcome::Panicked(p) => Outcome::Panicked(p),
    }
}
